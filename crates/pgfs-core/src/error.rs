//! Error types for pgfs-core

/// Result type for pgfs-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pgfs-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two siblings in the snapshot share a name
    #[error("Snapshot lists {kind} {name:?} more than once under the same parent")]
    DuplicateName { kind: &'static str, name: String },

    /// Filesystem error from pgfs-fs
    #[error(transparent)]
    Fs(#[from] pgfs_fs::Error),
}

impl Error {
    /// Whether the error stems from configuration rather than a failure
    /// during the run.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Fs(e) => e.is_configuration(),
            Self::DuplicateName { .. } => false,
        }
    }
}
