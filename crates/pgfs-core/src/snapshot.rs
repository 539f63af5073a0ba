//! Point-in-time catalog snapshot
//!
//! A snapshot is the read-only hierarchy `database → schema → table` as the
//! catalog reported it at the start of a run. It is never written back and
//! is discarded when the run ends.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Schema names that never appear in a mirror tree.
pub const RESERVED_SCHEMAS: &[&str] = &["pg_toast", "pg_catalog", "information_schema"];

/// Prefixes of per-backend temporary namespaces.
pub const TEMPORARY_SCHEMA_PREFIXES: &[&str] = &["pg_temp_", "pg_toast_temp_"];

/// Whether a schema with this name is excluded from snapshots.
pub fn is_reserved_schema(name: &str) -> bool {
    RESERVED_SCHEMAS.contains(&name)
        || TEMPORARY_SCHEMA_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
}

/// A table and the storage id of its backing file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    /// Storage id within the owning database (`relfilenode`).
    pub filenode: u32,
}

impl Table {
    pub fn new(name: impl Into<String>, filenode: u32) -> Self {
        Self {
            name: name.into(),
            filenode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub oid: u32,
    pub name: String,
    #[serde(default)]
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn new(oid: u32, name: impl Into<String>) -> Self {
        Self {
            oid,
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Builder-style helper to add a table.
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    /// Unique id; also names the database's storage directory.
    pub oid: u32,
    pub name: String,
    #[serde(default)]
    pub schemas: Vec<Schema>,
}

impl Database {
    pub fn new(oid: u32, name: impl Into<String>) -> Self {
        Self {
            oid,
            name: name.into(),
            schemas: Vec::new(),
        }
    }

    /// Builder-style helper to add a schema.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schemas.push(schema);
        self
    }
}

/// The catalog hierarchy captured for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub databases: Vec<Database>,
}

impl CatalogSnapshot {
    pub fn new(databases: Vec<Database>) -> Self {
        Self { databases }
    }

    /// Builder-style helper to add a database.
    pub fn with_database(mut self, database: Database) -> Self {
        self.databases.push(database);
        self
    }

    /// Drop reserved and temporary schemas.
    ///
    /// Suppliers that cannot filter at the source (snapshot files) run
    /// their output through this.
    pub fn without_reserved_schemas(mut self) -> Self {
        for db in &mut self.databases {
            db.schemas.retain(|sch| !is_reserved_schema(&sch.name));
        }
        self
    }

    /// Total number of tables across all databases.
    pub fn table_count(&self) -> usize {
        self.databases
            .iter()
            .flat_map(|db| &db.schemas)
            .map(|sch| sch.tables.len())
            .sum()
    }
}

/// Indented listing: databases, then schemas and tables two spaces deeper.
impl fmt::Display for CatalogSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for db in &self.databases {
            writeln!(f, "{}", db.name)?;
            for sch in &db.schemas {
                writeln!(f, "  {}", sch.name)?;
                for t in &sch.tables {
                    writeln!(f, "    {}", t.name)?;
                }
            }
        }
        Ok(())
    }
}
