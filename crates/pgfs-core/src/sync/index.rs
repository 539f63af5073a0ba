//! Name-keyed lookups over a snapshot, rebuilt for every run

use std::collections::{HashMap, HashSet};

use crate::snapshot::{CatalogSnapshot, Database, Schema};
use crate::{Error, Result};

/// Schema name → table names.
pub(crate) struct SchemaIndex<'a> {
    pub tables: HashSet<&'a str>,
}

/// Database name → schema lookups.
pub(crate) struct DatabaseIndex<'a> {
    pub schemas: HashMap<&'a str, SchemaIndex<'a>>,
}

/// Top-level lookup used by the pruning pass.
///
/// Building it also enforces sibling name uniqueness, so a malformed
/// snapshot is rejected before anything on disk changes.
pub(crate) struct SnapshotIndex<'a> {
    pub databases: HashMap<&'a str, DatabaseIndex<'a>>,
}

impl<'a> SnapshotIndex<'a> {
    pub fn build(snapshot: &'a CatalogSnapshot) -> Result<Self> {
        let mut databases = HashMap::with_capacity(snapshot.databases.len());
        for db in &snapshot.databases {
            if databases
                .insert(db.name.as_str(), index_database(db)?)
                .is_some()
            {
                return Err(duplicate("database", &db.name));
            }
        }
        Ok(Self { databases })
    }
}

fn index_database(db: &Database) -> Result<DatabaseIndex<'_>> {
    let mut schemas = HashMap::with_capacity(db.schemas.len());
    for sch in &db.schemas {
        if schemas
            .insert(sch.name.as_str(), index_schema(sch)?)
            .is_some()
        {
            return Err(duplicate("schema", &format!("{}.{}", db.name, sch.name)));
        }
    }
    Ok(DatabaseIndex { schemas })
}

fn index_schema(sch: &Schema) -> Result<SchemaIndex<'_>> {
    let mut tables = HashSet::with_capacity(sch.tables.len());
    for t in &sch.tables {
        if !tables.insert(t.name.as_str()) {
            return Err(duplicate("table", &format!("{}.{}", sch.name, t.name)));
        }
    }
    Ok(SchemaIndex { tables })
}

fn duplicate(kind: &'static str, name: &str) -> Error {
    Error::DuplicateName {
        kind,
        name: name.to_string(),
    }
}
