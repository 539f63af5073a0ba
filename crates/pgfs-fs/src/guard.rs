//! Destination root safety check
//!
//! pgfs deletes whatever in the destination does not match the catalog, so
//! it must never operate on a directory it did not create. A root is safe
//! when it is missing, empty, or already carries the sentinel file.

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use crate::constants::sentinel_path;
use crate::{Error, Result};

/// Outcome of [`prepare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootState {
    /// The root was missing or empty and has been turned into a managed tree.
    Bootstrapped,
    /// The root already carried the sentinel.
    Managed,
}

/// Validate or bootstrap the destination root.
///
/// - missing or empty directory: create it and write the empty sentinel
/// - non-empty with the sentinel: accept as-is
/// - anything else: [`Error::UnsafeRoot`], nothing is touched
pub fn prepare(root: &Path) -> Result<RootState> {
    match fs::metadata(root) {
        Ok(meta) if !meta.is_dir() => {
            return Err(Error::UnsafeRoot {
                path: root.to_path_buf(),
            });
        }
        Ok(_) => {
            if !is_empty_dir(root)? {
                let sentinel = sentinel_path(root);
                return if sentinel.is_file() {
                    debug!(root = %root.display(), "destination is a managed tree");
                    Ok(RootState::Managed)
                } else {
                    Err(Error::UnsafeRoot {
                        path: root.to_path_buf(),
                    })
                };
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            fs::create_dir_all(root).map_err(|e| Error::io(root, e))?;
        }
        Err(e) => return Err(Error::io(root, e)),
    }

    touch_sentinel(root)?;
    info!(root = %root.display(), "bootstrapped new mirror tree");
    Ok(RootState::Bootstrapped)
}

fn is_empty_dir(root: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(root).map_err(|e| Error::io(root, e))?;
    Ok(entries.next().is_none())
}

fn touch_sentinel(root: &Path) -> Result<()> {
    let sentinel = sentinel_path(root);
    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&sentinel)
    {
        Ok(_) => Ok(()),
        // Another run bootstrapped the same root first.
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(Error::io(sentinel, e)),
    }
}
