//! JSON snapshot files
//!
//! The file holds a serialized [`CatalogSnapshot`]:
//!
//! ```json
//! {"databases": [{"oid": 16384, "name": "shop", "schemas": [
//!     {"oid": 2200, "name": "public", "tables": [{"name": "orders", "filenode": 16385}]}
//! ]}]}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pgfs_core::CatalogSnapshot;
use tracing::debug;

use crate::{CatalogSource, Error, Result};

/// Snapshot read from a JSON file.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file, dropping reserved schemas.
    pub fn load(&self) -> Result<CatalogSnapshot> {
        let content = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let snapshot: CatalogSnapshot =
            serde_json::from_str(&content).map_err(|source| Error::SnapshotParse {
                path: self.path.clone(),
                source,
            })?;
        debug!(
            path = %self.path.display(),
            databases = snapshot.databases.len(),
            tables = snapshot.table_count(),
            "loaded snapshot file"
        );
        Ok(snapshot.without_reserved_schemas())
    }
}

#[async_trait]
impl CatalogSource for SnapshotFile {
    async fn fetch_snapshot(&self) -> Result<CatalogSnapshot> {
        self.load()
    }

    async fn storage_root(&self) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "databases": [{
            "oid": 16384,
            "name": "shop",
            "schemas": [
                {"oid": 2200, "name": "public", "tables": [{"name": "orders", "filenode": 16385}]},
                {"oid": 99, "name": "pg_toast", "tables": [{"name": "pg_toast_16385", "filenode": 16388}]}
            ]
        }]
    }"#;

    #[test]
    fn load_parses_and_strips_reserved_schemas() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, SAMPLE).unwrap();

        let snapshot = SnapshotFile::new(&path).load().unwrap();

        assert_eq!(snapshot.to_string(), "shop\n  public\n    orders\n");
        assert_eq!(snapshot.databases[0].schemas[0].tables[0].filenode, 16385);
    }

    #[test]
    fn invalid_json_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = SnapshotFile::new(&path).load().unwrap_err();

        assert!(matches!(err, Error::SnapshotParse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = SnapshotFile::new(dir.path().join("absent.json"))
            .load()
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[tokio::test]
    async fn source_has_no_storage_root() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, SAMPLE).unwrap();
        let source = SnapshotFile::new(&path);

        assert_eq!(source.storage_root().await.unwrap(), None);
        assert_eq!(source.fetch_snapshot().await.unwrap().table_count(), 1);
    }
}
