//! Guarded mirror run
//!
//! Wires the safety pieces around one synchronization pass:
//!
//! 1. destination and storage root must share a volume
//! 2. the destination must be fresh or already managed
//! 3. the sentinel lock is held for the whole pass
//! 4. the lock is released on every exit path

use std::path::Path;

use pgfs_fs::{TreeLock, sentinel_path};
use tracing::{debug, warn};

use crate::layout::StorageLayout;
use crate::snapshot::CatalogSnapshot;
use crate::sync::{SyncReport, TreeSynchronizer};
use crate::Result;

/// Mirror `snapshot` into `dest_root` with the default storage layout.
pub fn run(snapshot: &CatalogSnapshot, dest_root: &Path, storage_root: &Path) -> Result<SyncReport> {
    run_with(&TreeSynchronizer::new(dest_root, storage_root), snapshot)
}

/// Mirror `snapshot` using a preconfigured synchronizer.
///
/// # Errors
///
/// - [`pgfs_fs::Error::CrossDevice`] if the roots are on different volumes
/// - [`pgfs_fs::Error::UnsafeRoot`] if the destination is not a managed tree
/// - [`pgfs_fs::Error::AlreadyLocked`] if another run holds the tree
/// - any error from [`TreeSynchronizer::sync`]
///
/// The first three leave the filesystem untouched.
pub fn run_with<L: StorageLayout>(
    synchronizer: &TreeSynchronizer<L>,
    snapshot: &CatalogSnapshot,
) -> Result<SyncReport> {
    let dest_root = synchronizer.dest_root();

    pgfs_fs::same_volume(dest_root, synchronizer.storage_root())?;

    let state = pgfs_fs::prepare(dest_root)?;
    debug!(root = %dest_root.display(), ?state, "destination root ready");

    let lock = TreeLock::acquire(&sentinel_path(dest_root))?;
    let result = synchronizer.sync(snapshot);

    if let Err(e) = lock.release() {
        warn!(error = %e, "tree lock release failed");
    }
    result
}
