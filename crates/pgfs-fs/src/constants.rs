//! Well-known names inside a mirror tree.

use std::path::Path;

/// Name of the empty sentinel file at the top of every managed mirror tree.
///
/// Its presence marks the directory as owned by pgfs, and it is the target
/// of the exclusive run lock.
pub const SENTINEL: &str = ".pgfs";

/// Path of the sentinel inside `root`.
pub fn sentinel_path(root: &Path) -> std::path::PathBuf {
    root.join(SENTINEL)
}
