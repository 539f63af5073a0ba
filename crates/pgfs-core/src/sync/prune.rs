//! Reverse pass: remove entries the snapshot no longer names
//!
//! Descends database → schema → table so a dropped database goes in one
//! recursive delete. Only the sentinel is exempt at the top level.

use std::fs;
use std::path::Path;

use pgfs_fs::SENTINEL;
use tracing::debug;

use crate::Result;

use super::engine::remove_entry;
use super::index::{DatabaseIndex, SchemaIndex, SnapshotIndex};
use super::report::SyncReport;

pub(super) fn prune_root(
    root: &Path,
    index: &SnapshotIndex<'_>,
    report: &mut SyncReport,
) -> Result<()> {
    for (name, path) in list_entries(root)? {
        if name.as_deref() == Some(SENTINEL) {
            continue;
        }
        match name.as_deref().and_then(|n| index.databases.get(n)) {
            Some(db) => prune_database(&path, db, report)?,
            None => prune(&path, "database", report)?,
        }
    }
    Ok(())
}

fn prune_database(dir: &Path, db: &DatabaseIndex<'_>, report: &mut SyncReport) -> Result<()> {
    for (name, path) in list_entries(dir)? {
        match name.as_deref().and_then(|n| db.schemas.get(n)) {
            Some(sch) => prune_schema(&path, sch, report)?,
            None => prune(&path, "schema", report)?,
        }
    }
    Ok(())
}

fn prune_schema(dir: &Path, sch: &SchemaIndex<'_>, report: &mut SyncReport) -> Result<()> {
    for (name, path) in list_entries(dir)? {
        let known = name.as_deref().is_some_and(|n| sch.tables.contains(n));
        if !known {
            prune(&path, "table", report)?;
        }
    }
    Ok(())
}

fn prune(path: &Path, kind: &str, report: &mut SyncReport) -> Result<()> {
    remove_entry(path)?;
    debug!(path = %path.display(), kind, "pruned dropped entry");
    report.pruned += 1;
    Ok(())
}

/// Entries of `dir` as (UTF-8 name if any, full path).
///
/// A name that is not valid UTF-8 can never match a catalog name.
fn list_entries(dir: &Path) -> Result<Vec<(Option<String>, std::path::PathBuf)>> {
    let entries = fs::read_dir(dir).map_err(|e| pgfs_fs::Error::io(dir, e))?;
    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| pgfs_fs::Error::io(dir, e))?;
        let name = entry.file_name().into_string().ok();
        out.push((name, entry.path()));
    }
    Ok(out)
}
