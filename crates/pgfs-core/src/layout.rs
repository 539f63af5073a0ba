//! Mapping from a table's storage locator to its backing file

use std::path::{Path, PathBuf};

/// Resolves where a table's data lives under the storage root.
///
/// Implementations are pure path arithmetic; nothing is read or written.
pub trait StorageLayout {
    fn resolve(&self, storage_root: &Path, database_oid: u32, filenode: u32) -> PathBuf;
}

/// Default-tablespace layout: `<root>/base/<database oid>/<filenode>`.
///
/// Only the first segment of a relation is addressed; tables larger than
/// one segment keep their `.1`, `.2`, ... files unmirrored.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgBaseLayout;

impl StorageLayout for PgBaseLayout {
    fn resolve(&self, storage_root: &Path, database_oid: u32, filenode: u32) -> PathBuf {
        storage_root
            .join("base")
            .join(database_oid.to_string())
            .join(filenode.to_string())
    }
}
