//! Error types for pgfs-fs

use std::path::PathBuf;

/// Result type for pgfs-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pgfs-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "{path} already exists and doesn't look like a pgfs tree (no .pgfs file found); \
         refusing to continue lest we delete something we shouldn't"
    )]
    UnsafeRoot { path: PathBuf },

    #[error("{path} is already locked by another pgfs run; refusing to continue")]
    AlreadyLocked { path: PathBuf },

    #[error("Advisory locking is not supported on this platform (lock target {path})")]
    LockUnsupported { path: PathBuf },

    #[error(
        "Destination {dest} and storage root {storage} are on different volumes; \
         hard links cannot span filesystems"
    )]
    CrossDevice { dest: PathBuf, storage: PathBuf },

    #[error("{operation} is not supported on this platform")]
    Unsupported { operation: &'static str },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a configuration problem rather than a
    /// failure of the filesystem mid-run.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::CrossDevice { .. } | Self::LockUnsupported { .. } | Self::Unsupported { .. }
        )
    }
}
