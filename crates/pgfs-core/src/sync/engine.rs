//! TreeSynchronizer implementation
//!
//! The synchronizer reconciles a mirror tree with a catalog snapshot in two
//! passes. The forward pass creates missing directories and links and
//! repairs links whose storage identity changed. The reverse pass prunes
//! whatever the snapshot no longer names.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pgfs_fs::{SENTINEL, is_valid_component, same_file, sentinel_path};
use tracing::{debug, info, warn};

use crate::layout::{PgBaseLayout, StorageLayout};
use crate::snapshot::{CatalogSnapshot, Database, Schema, Table};
use crate::Result;

use super::index::SnapshotIndex;
use super::report::SyncReport;

/// Reconciles one mirror tree against catalog snapshots.
pub struct TreeSynchronizer<L: StorageLayout = PgBaseLayout> {
    /// Root of the mirror tree
    dest_root: PathBuf,
    /// Root the storage layout resolves table files under
    storage_root: PathBuf,
    layout: L,
}

impl TreeSynchronizer<PgBaseLayout> {
    /// Create a synchronizer using the default storage layout.
    pub fn new(dest_root: impl Into<PathBuf>, storage_root: impl Into<PathBuf>) -> Self {
        Self::with_layout(dest_root, storage_root, PgBaseLayout)
    }
}

impl<L: StorageLayout> TreeSynchronizer<L> {
    pub fn with_layout(
        dest_root: impl Into<PathBuf>,
        storage_root: impl Into<PathBuf>,
        layout: L,
    ) -> Self {
        Self {
            dest_root: dest_root.into(),
            storage_root: storage_root.into(),
            layout,
        }
    }

    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Bring the mirror tree in line with `snapshot`.
    ///
    /// The caller is expected to hold the tree lock. On error, mutations
    /// already applied stay in place; running again converges further.
    ///
    /// # Errors
    ///
    /// - [`pgfs_fs::Error::UnsafeRoot`] before any mutation if the root
    ///   carries no sentinel file
    /// - [`crate::Error::DuplicateName`] before any mutation if siblings
    ///   share a name
    /// - [`pgfs_fs::Error::Io`] for any unexpected filesystem failure
    /// - [`pgfs_fs::Error::CrossDevice`] if a link would span volumes
    pub fn sync(&self, snapshot: &CatalogSnapshot) -> Result<SyncReport> {
        self.check_managed()?;
        let index = SnapshotIndex::build(snapshot)?;
        let mut report = SyncReport::default();

        for db in &snapshot.databases {
            self.sync_database(db, &mut report)?;
        }
        super::prune::prune_root(&self.dest_root, &index, &mut report)?;

        info!(
            root = %self.dest_root.display(),
            created = report.created,
            repaired = report.repaired,
            pruned = report.pruned,
            skipped = report.skipped,
            "mirror tree synchronized"
        );
        Ok(report)
    }

    /// Refuse to touch a root that `pgfs_fs::prepare` has not claimed.
    fn check_managed(&self) -> Result<()> {
        match fs::symlink_metadata(sentinel_path(&self.dest_root)) {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(self.unsafe_root()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(self.unsafe_root()),
            Err(e) => Err(pgfs_fs::Error::io(&self.dest_root, e).into()),
        }
    }

    fn unsafe_root(&self) -> crate::Error {
        pgfs_fs::Error::UnsafeRoot {
            path: self.dest_root.clone(),
        }
        .into()
    }

    fn sync_database(&self, db: &Database, report: &mut SyncReport) -> Result<()> {
        if !is_valid_component(&db.name) || db.name == SENTINEL {
            warn!(database = %db.name, "database name cannot be mirrored; skipping");
            report.skipped += 1;
            return Ok(());
        }

        let db_dir = self.dest_root.join(&db.name);
        ensure_dir(&db_dir, report)?;

        for sch in &db.schemas {
            self.sync_schema(db, sch, &db_dir, report)?;
        }
        Ok(())
    }

    fn sync_schema(
        &self,
        db: &Database,
        sch: &Schema,
        db_dir: &Path,
        report: &mut SyncReport,
    ) -> Result<()> {
        if !is_valid_component(&sch.name) {
            warn!(database = %db.name, schema = %sch.name, "schema name cannot be mirrored; skipping");
            report.skipped += 1;
            return Ok(());
        }

        let sch_dir = db_dir.join(&sch.name);
        ensure_dir(&sch_dir, report)?;

        for t in &sch.tables {
            self.sync_table(db, t, &sch_dir, report)?;
        }
        Ok(())
    }

    fn sync_table(
        &self,
        db: &Database,
        t: &Table,
        sch_dir: &Path,
        report: &mut SyncReport,
    ) -> Result<()> {
        if !is_valid_component(&t.name) {
            warn!(database = %db.name, table = %t.name, "table name cannot be mirrored; skipping");
            report.skipped += 1;
            return Ok(());
        }

        let src = self.layout.resolve(&self.storage_root, db.oid, t.filenode);
        ensure_link(&src, &sch_dir.join(&t.name), report)
    }
}

/// Make sure `path` is a directory. A non-directory squatting on the name
/// is replaced.
fn ensure_dir(path: &Path, report: &mut SyncReport) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => {
            fs::remove_file(path).map_err(|e| pgfs_fs::Error::io(path, e))?;
            fs::create_dir(path).map_err(|e| pgfs_fs::Error::io(path, e))?;
            debug!(path = %path.display(), "replaced non-directory with directory");
            report.repaired += 1;
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => match fs::create_dir(path) {
            Ok(()) => {
                debug!(path = %path.display(), "created directory");
                report.created += 1;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists && is_plain_dir(path) => Ok(()),
            Err(e) => Err(pgfs_fs::Error::io(path, e).into()),
        },
        Err(e) => Err(pgfs_fs::Error::io(path, e).into()),
    }
}

/// Whether `path` itself is a directory; a symlink to one is not.
fn is_plain_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
}

/// Make sure `dest` is a hard link to `src`.
///
/// Linking is attempted first; an existing entry is then checked for
/// storage identity and replaced when it names a different file.
fn ensure_link(src: &Path, dest: &Path, report: &mut SyncReport) -> Result<()> {
    match fs::hard_link(src, dest) {
        Ok(()) => {
            debug!(src = %src.display(), dest = %dest.display(), "created link");
            report.created += 1;
            return Ok(());
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
        Err(e) => return Err(link_error(src, dest, e)),
    }

    match same_file(src, dest) {
        Ok(true) => return Ok(()),
        Ok(false) => {}
        Err(e) => {
            let path = if src.exists() { dest } else { src };
            return Err(pgfs_fs::Error::io(path, e).into());
        }
    }

    remove_entry(dest)?;
    fs::hard_link(src, dest).map_err(|e| link_error(src, dest, e))?;
    debug!(src = %src.display(), dest = %dest.display(), "repaired stale link");
    report.repaired += 1;
    Ok(())
}

fn link_error(src: &Path, dest: &Path, e: std::io::Error) -> crate::Error {
    match e.kind() {
        ErrorKind::CrossesDevices => pgfs_fs::Error::CrossDevice {
            dest: dest.to_path_buf(),
            storage: src.to_path_buf(),
        }
        .into(),
        ErrorKind::NotFound if !src.exists() => pgfs_fs::Error::io(src, e).into(),
        _ => pgfs_fs::Error::io(dest, e).into(),
    }
}

/// Remove a single directory entry without following symlinks.
pub(super) fn remove_entry(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path).map_err(|e| pgfs_fs::Error::io(path, e))?;
    let removed = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    removed.map_err(|e| pgfs_fs::Error::io(path, e))?;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ensure_dir_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shop");
        let mut report = SyncReport::default();

        ensure_dir(&path, &mut report).unwrap();
        ensure_dir(&path, &mut report).unwrap();

        assert!(path.is_dir());
        assert_eq!(report.created, 1);
    }

    #[test]
    fn ensure_dir_replaces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shop");
        fs::write(&path, b"stray").unwrap();
        let mut report = SyncReport::default();

        ensure_dir(&path, &mut report).unwrap();

        assert!(path.is_dir());
        assert_eq!(report.repaired, 1);
    }

    #[test]
    fn symlinked_directory_is_not_plain() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("elsewhere");
        let link = dir.path().join("shop");
        fs::create_dir(&target).unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert!(is_plain_dir(&target));
        assert!(!is_plain_dir(&link));
        assert!(!is_plain_dir(&dir.path().join("absent")));
    }

    #[test]
    fn ensure_dir_replaces_symlink_to_directory() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("elsewhere");
        let path = dir.path().join("shop");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"x").unwrap();
        std::os::unix::fs::symlink(&target, &path).unwrap();
        let mut report = SyncReport::default();

        ensure_dir(&path, &mut report).unwrap();

        assert!(is_plain_dir(&path));
        assert!(target.join("keep").is_file());
        assert_eq!(report.repaired, 1);
    }

    #[test]
    fn ensure_link_repairs_wrong_target() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("100");
        let new = dir.path().join("200");
        let dest = dir.path().join("orders");
        fs::write(&old, b"old heap").unwrap();
        fs::write(&new, b"new heap").unwrap();
        fs::hard_link(&old, &dest).unwrap();
        let mut report = SyncReport::default();

        ensure_link(&new, &dest, &mut report).unwrap();

        assert!(same_file(&new, &dest).unwrap());
        assert_eq!(report.repaired, 1);
        assert_eq!(report.created, 0);
    }

    #[test]
    fn ensure_link_replaces_directory_squatter() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("100");
        let dest = dir.path().join("orders");
        fs::write(&src, b"heap").unwrap();
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("junk"), b"x").unwrap();
        let mut report = SyncReport::default();

        ensure_link(&src, &dest, &mut report).unwrap();

        assert!(same_file(&src, &dest).unwrap());
        assert_eq!(report.repaired, 1);
    }

    #[test]
    fn missing_source_reports_source_path() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("gone");
        let dest = dir.path().join("orders");
        let mut report = SyncReport::default();

        let err = ensure_link(&src, &dest, &mut report).unwrap_err();

        match err {
            crate::Error::Fs(pgfs_fs::Error::Io { path, .. }) => assert_eq!(path, src),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
