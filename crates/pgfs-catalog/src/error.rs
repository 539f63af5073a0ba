//! Error types for pgfs-catalog

use std::path::PathBuf;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing a catalog snapshot
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection or query failure against the catalog
    #[error("Catalog query failed: {0}")]
    Database(#[from] sqlx::Error),

    /// Snapshot file is not valid JSON for a catalog snapshot
    #[error("Failed to parse snapshot {path}: {source}")]
    SnapshotParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An object id did not fit the 32-bit oid range
    #[error("Catalog returned out-of-range oid {value} for {what}")]
    OidOutOfRange { what: &'static str, value: i64 },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
