//! [`TestCluster`] fixture for mirror scenarios.
//!
//! Lays out a fake data directory (`pgdata/base/<db oid>/<filenode>`) and a
//! sibling mirror root on one temporary volume, so hard links work.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name of the sentinel file, duplicated here to keep this crate free of
/// workspace dependencies.
const SENTINEL: &str = ".pgfs";

/// A temporary storage root and mirror root with helpers for setup and
/// assertion.
///
/// # Example
///
/// ```rust,no_run
/// use pgfs_test_utils::TestCluster;
///
/// let cluster = TestCluster::new();
/// cluster.create_relation(16384, 16385);
/// // ... run a sync into cluster.mirror_root() ...
/// cluster.assert_linked("shop/public/orders", 16384, 16385);
/// ```
pub struct TestCluster {
    temp_dir: TempDir,
}

impl Default for TestCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCluster {
    /// Create the temporary directory and an empty `pgdata/base`.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("pgdata").join("base")).unwrap();
        Self { temp_dir }
    }

    /// Root of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The fake data directory.
    pub fn storage_root(&self) -> PathBuf {
        self.root().join("pgdata")
    }

    /// The mirror destination. Not created until a run bootstraps it.
    pub fn mirror_root(&self) -> PathBuf {
        self.root().join("mirror")
    }

    /// Path of a relation's backing file.
    pub fn relation_path(&self, db_oid: u32, filenode: u32) -> PathBuf {
        self.storage_root()
            .join("base")
            .join(db_oid.to_string())
            .join(filenode.to_string())
    }

    /// Create a relation's backing file with recognisable content.
    pub fn create_relation(&self, db_oid: u32, filenode: u32) -> PathBuf {
        let path = self.relation_path(db_oid, filenode);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("relation {db_oid}/{filenode}")).unwrap();
        path
    }

    /// Simulate a table rewrite: the data moves to a new filenode and the
    /// old file disappears.
    pub fn rewrite_relation(&self, db_oid: u32, old_filenode: u32, new_filenode: u32) -> PathBuf {
        let new_path = self.create_relation(db_oid, new_filenode);
        fs::remove_file(self.relation_path(db_oid, old_filenode)).unwrap();
        new_path
    }

    /// Write an arbitrary file under the temporary root.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Absolute path of a mirror entry given as `db/schema/table`.
    pub fn mirror_path(&self, rel: &str) -> PathBuf {
        rel.split('/')
            .fold(self.mirror_root(), |path, part| path.join(part))
    }

    /// Every entry under the mirror root as a `/`-joined relative path,
    /// excluding the sentinel.
    pub fn mirror_entries(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        collect(&self.mirror_root(), "", &mut out);
        out.remove(SENTINEL);
        out
    }

    /// Assert that `rel` is a hard link to the relation's backing file.
    ///
    /// # Panics
    /// Panics with a descriptive message if the entry is missing or names a
    /// different inode.
    #[cfg(unix)]
    pub fn assert_linked(&self, rel: &str, db_oid: u32, filenode: u32) {
        use std::os::unix::fs::MetadataExt;

        let link = self.mirror_path(rel);
        let src = self.relation_path(db_oid, filenode);
        let link_meta = fs::symlink_metadata(&link)
            .unwrap_or_else(|e| panic!("Expected link {}: {e}", link.display()));
        let src_meta = fs::metadata(&src)
            .unwrap_or_else(|e| panic!("Expected relation {}: {e}", src.display()));
        assert!(
            link_meta.dev() == src_meta.dev() && link_meta.ino() == src_meta.ino(),
            "Expected {} to be a hard link to {}",
            link.display(),
            src.display()
        );
    }

    /// Assert that `rel` does **not** exist under the mirror root.
    ///
    /// # Panics
    /// Panics with a descriptive message if the entry exists.
    pub fn assert_not_exists(&self, rel: &str) {
        let path = self.mirror_path(rel);
        assert!(
            fs::symlink_metadata(&path).is_err(),
            "Expected entry NOT to exist: {}",
            path.display()
        );
    }

    /// Inode number of a mirror entry, for "left untouched" assertions.
    #[cfg(unix)]
    pub fn inode_of(&self, rel: &str) -> u64 {
        use std::os::unix::fs::MetadataExt;

        fs::symlink_metadata(self.mirror_path(rel)).unwrap().ino()
    }
}

fn collect(dir: &Path, prefix: &str, out: &mut BTreeSet<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries {
        let entry = entry.unwrap();
        let name = entry.file_name().to_string_lossy().into_owned();
        let rel = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        if entry.file_type().unwrap().is_dir() {
            collect(&entry.path(), &rel, out);
        }
        out.insert(rel);
    }
}
