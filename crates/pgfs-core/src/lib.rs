//! Core synchronization layer for pgfs
//!
//! This crate mirrors a catalog snapshot into a tree of directories and
//! hard links, implementing:
//!
//! - **Snapshot model**: databases, schemas and tables as captured for one run
//! - **Storage layout**: where each table's backing file lives
//! - **TreeSynchronizer**: forward create/repair pass and reverse prune pass
//! - **Mirror run**: volume check, root guard and tree lock around a pass
//!
//! # Architecture
//!
//! ```text
//!           pgfs-cli
//!          /        \
//!   pgfs-catalog     |
//!          \        /
//!          pgfs-core
//!              |
//!           pgfs-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use pgfs_core::{CatalogSnapshot, Database, Schema, Table, mirror};
//! use std::path::Path;
//!
//! let snapshot = CatalogSnapshot::default().with_database(
//!     Database::new(16384, "shop")
//!         .with_schema(Schema::new(2200, "public").with_table(Table::new("orders", 16385))),
//! );
//! let report = mirror::run(
//!     &snapshot,
//!     Path::new("/srv/pgfs"),
//!     Path::new("/var/lib/postgresql/16/main"),
//! )?;
//! println!("{} created", report.created);
//! # Ok::<(), pgfs_core::Error>(())
//! ```

pub mod error;
pub mod layout;
pub mod mirror;
pub mod snapshot;
pub mod sync;

pub use error::{Error, Result};
pub use layout::{PgBaseLayout, StorageLayout};
pub use snapshot::{CatalogSnapshot, Database, Schema, Table, is_reserved_schema};
pub use sync::{SyncReport, TreeSynchronizer};
