//! Catalog snapshot suppliers for pgfs
//!
//! A supplier captures the `database → schema → table` hierarchy once per
//! run and reports where table storage lives. Two are provided:
//!
//! - [`PgCatalog`]: a live PostgreSQL cluster, configured through the usual
//!   libpq environment (`PGHOST`, `PGPORT`, `PGUSER`, ...)
//! - [`SnapshotFile`]: a JSON snapshot on disk, for offline use

pub mod error;
pub mod file;
pub mod postgres;

use std::path::PathBuf;

use async_trait::async_trait;
use pgfs_core::CatalogSnapshot;

pub use error::{Error, Result};
pub use file::SnapshotFile;
pub use postgres::PgCatalog;

/// Read-only source of catalog snapshots.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Capture the current hierarchy. Reserved and temporary schemas are
    /// never included.
    async fn fetch_snapshot(&self) -> Result<CatalogSnapshot>;

    /// Root directory that table storage paths resolve under, if the
    /// source knows it.
    async fn storage_root(&self) -> Result<Option<PathBuf>>;
}
