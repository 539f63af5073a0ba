//! Storage identity of files and volumes
//!
//! A mirror link is correct when it names the same inode as the table's
//! backing file. Both sides must live on one volume for a hard link to be
//! possible at all.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{Error, Result};

/// Whether `src` and `link` refer to the same underlying file.
///
/// `link` is inspected without following symlinks: a symlink to the right
/// file is not a hard link and does not count.
#[cfg(unix)]
pub fn same_file(src: &Path, link: &Path) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let src_meta = fs::metadata(src)?;
    let link_meta = fs::symlink_metadata(link)?;
    Ok(src_meta.dev() == link_meta.dev() && src_meta.ino() == link_meta.ino())
}

#[cfg(not(unix))]
pub fn same_file(_src: &Path, _link: &Path) -> io::Result<bool> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "file identity comparison requires unix metadata",
    ))
}

/// Verify that `dest` and `storage` sit on the same volume.
///
/// `dest` may not exist yet; its nearest existing ancestor stands in for
/// it, which is where the directory would be created.
pub fn same_volume(dest: &Path, storage: &Path) -> Result<()> {
    let anchor = nearest_existing_ancestor(dest)?;
    let dest_dev = device_of(&anchor)?;
    let storage_dev = device_of(storage)?;

    debug!(
        dest = %anchor.display(),
        storage = %storage.display(),
        dest_dev,
        storage_dev,
        "compared volumes"
    );

    if dest_dev == storage_dev {
        Ok(())
    } else {
        Err(Error::CrossDevice {
            dest: dunce::canonicalize(&anchor).unwrap_or(anchor),
            storage: dunce::canonicalize(storage).unwrap_or_else(|_| storage.to_path_buf()),
        })
    }
}

fn nearest_existing_ancestor(path: &Path) -> Result<PathBuf> {
    let mut current = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    loop {
        match fs::metadata(current) {
            Ok(_) => return Ok(current.to_path_buf()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => match current.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => current = parent,
                _ => return Ok(PathBuf::from(".")),
            },
            Err(e) => return Err(Error::io(current, e)),
        }
    }
}

#[cfg(unix)]
fn device_of(path: &Path) -> Result<u64> {
    use std::os::unix::fs::MetadataExt;

    fs::metadata(path)
        .map(|m| m.dev())
        .map_err(|e| Error::io(path, e))
}

#[cfg(not(unix))]
fn device_of(_path: &Path) -> Result<u64> {
    Err(Error::Unsupported {
        operation: "volume identity check",
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn hard_link_shares_identity() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("16384");
        let link = dir.path().join("orders");
        fs::write(&src, b"heap").unwrap();
        fs::hard_link(&src, &link).unwrap();

        assert!(same_file(&src, &link).unwrap());
    }

    #[test]
    fn copy_does_not_share_identity() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("16384");
        let copy = dir.path().join("orders");
        fs::write(&src, b"heap").unwrap();
        fs::copy(&src, &copy).unwrap();

        assert!(!same_file(&src, &copy).unwrap());
    }

    #[test]
    fn symlink_is_not_a_hard_link() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("16384");
        let link = dir.path().join("orders");
        fs::write(&src, b"heap").unwrap();
        std::os::unix::fs::symlink(&src, &link).unwrap();

        assert!(!same_file(&src, &link).unwrap());
    }

    #[test]
    fn missing_destination_uses_existing_ancestor() {
        let dir = tempdir().unwrap();
        let storage = dir.path().join("pgdata");
        fs::create_dir(&storage).unwrap();

        same_volume(&dir.path().join("not").join("yet").join("there"), &storage).unwrap();
    }

    #[test]
    fn missing_storage_root_is_io_error() {
        let dir = tempdir().unwrap();
        let err = same_volume(dir.path(), &dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
