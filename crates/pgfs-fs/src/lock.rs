//! Exclusive run lock on the sentinel file
//!
//! Only one synchronization pass may mutate a mirror tree at a time. The
//! lock is advisory, non-blocking and taken on the sentinel file itself:
//! contention fails immediately with [`Error::AlreadyLocked`].

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{Error, Result};

/// Platform capability for advisory exclusive file locks.
pub trait LockBackend {
    /// Try to take an exclusive lock without waiting.
    fn try_lock_exclusive(&self, file: &File) -> io::Result<()>;

    /// Release a lock taken by [`LockBackend::try_lock_exclusive`].
    fn unlock(&self, file: &File) -> io::Result<()>;

    /// Whether `err` means the lock is held elsewhere.
    fn is_contended(&self, err: &io::Error) -> bool;
}

/// `flock`/`LockFileEx` backend provided by `fs2`.
#[cfg(any(unix, windows))]
#[derive(Debug, Default, Clone, Copy)]
pub struct Fs2Backend;

#[cfg(any(unix, windows))]
impl LockBackend for Fs2Backend {
    fn try_lock_exclusive(&self, file: &File) -> io::Result<()> {
        fs2::FileExt::try_lock_exclusive(file)
    }

    fn unlock(&self, file: &File) -> io::Result<()> {
        fs2::FileExt::unlock(file)
    }

    fn is_contended(&self, err: &io::Error) -> bool {
        err.kind() == io::ErrorKind::WouldBlock
            || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
    }
}

/// Backend for targets without an advisory lock primitive.
///
/// Every attempt fails with [`io::ErrorKind::Unsupported`], which surfaces
/// as [`Error::LockUnsupported`]; runs are refused rather than left
/// unguarded.
#[cfg(not(any(unix, windows)))]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedBackend;

#[cfg(not(any(unix, windows)))]
impl LockBackend for UnsupportedBackend {
    fn try_lock_exclusive(&self, _file: &File) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }

    fn unlock(&self, _file: &File) -> io::Result<()> {
        Ok(())
    }

    fn is_contended(&self, _err: &io::Error) -> bool {
        false
    }
}

#[cfg(any(unix, windows))]
pub type DefaultBackend = Fs2Backend;

#[cfg(not(any(unix, windows)))]
pub type DefaultBackend = UnsupportedBackend;

/// Held exclusive lock on a mirror tree's sentinel.
///
/// Released by [`TreeLock::release`], or on drop for every other exit path.
#[derive(Debug)]
pub struct TreeLock<B: LockBackend = DefaultBackend> {
    file: File,
    path: PathBuf,
    backend: B,
    released: bool,
}

impl TreeLock<DefaultBackend> {
    /// Acquire the lock on `sentinel` with the platform default backend.
    pub fn acquire(sentinel: &Path) -> Result<Self> {
        Self::acquire_with(sentinel, DefaultBackend::default())
    }
}

impl<B: LockBackend> TreeLock<B> {
    /// Acquire the lock on `sentinel` using `backend`.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyLocked`] if another holder has it
    /// - [`Error::LockUnsupported`] if the platform has no lock primitive
    /// - [`Error::Io`] if the sentinel cannot be opened
    pub fn acquire_with(sentinel: &Path, backend: B) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(sentinel)
            .map_err(|e| Error::io(sentinel, e))?;

        match backend.try_lock_exclusive(&file) {
            Ok(()) => {
                debug!(path = %sentinel.display(), "acquired tree lock");
                Ok(Self {
                    file,
                    path: sentinel.to_path_buf(),
                    backend,
                    released: false,
                })
            }
            Err(e) if backend.is_contended(&e) => Err(Error::AlreadyLocked {
                path: sentinel.to_path_buf(),
            }),
            Err(e) if e.kind() == io::ErrorKind::Unsupported => Err(Error::LockUnsupported {
                path: sentinel.to_path_buf(),
            }),
            Err(e) => Err(Error::io(sentinel, e)),
        }
    }

    /// Path of the locked sentinel.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock explicitly, reporting any unlock failure.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.backend
            .unlock(&self.file)
            .map_err(|e| Error::io(&self.path, e))?;
        debug!(path = %self.path.display(), "released tree lock");
        Ok(())
    }
}

impl<B: LockBackend> Drop for TreeLock<B> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Closing the handle drops the lock too; unlock first so it is
        // gone before the descriptor is recycled.
        if let Err(e) = self.backend.unlock(&self.file) {
            warn!(path = %self.path.display(), error = %e, "failed to release tree lock");
        }
    }
}
