//! Live PostgreSQL catalog
//!
//! Connects once to list databases and the data directory, then once per
//! database to read its schemas and tables. Nothing is ever written.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use pgfs_core::{CatalogSnapshot, Database, Schema, Table, is_reserved_schema};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;
use tracing::{debug, info};

use crate::{CatalogSource, Error, Result};

/// Connectable databases stored in the default tablespace.
const DATABASES_SQL: &str = "\
    SELECT d.oid::int8, d.datname::text \
    FROM pg_database d \
    JOIN pg_tablespace ts ON ts.oid = d.dattablespace \
    WHERE NOT d.datistemplate AND d.datallowconn AND ts.spcname = 'pg_default' \
    ORDER BY d.datname";

const SCHEMAS_SQL: &str = "SELECT n.oid::int8, n.nspname::text FROM pg_namespace n";

/// Ordinary tables in the database's default tablespace.
const TABLES_SQL: &str = "\
    SELECT c.relnamespace::int8, c.relname::text, pg_relation_filenode(c.oid)::int8 \
    FROM pg_class c \
    WHERE c.relkind = 'r' AND c.reltablespace = 0 \
      AND pg_relation_filenode(c.oid) IS NOT NULL";

/// Catalog supplier backed by a PostgreSQL cluster.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    options: PgConnectOptions,
}

impl PgCatalog {
    pub fn new(options: PgConnectOptions) -> Self {
        Self { options }
    }

    /// Connection settings from the standard libpq environment variables.
    pub fn from_env() -> Self {
        Self::new(PgConnectOptions::new())
    }

    async fn connect(&self, database: Option<&str>) -> Result<PgConnection> {
        let options = match database {
            Some(name) => self.options.clone().database(name),
            None => self.options.clone(),
        };
        Ok(PgConnection::connect_with(&options).await?)
    }

    async fn fetch_database(&self, oid: u32, name: String) -> Result<Database> {
        let mut conn = self.connect(Some(&name)).await?;
        let schemas: Vec<(i64, String)> = sqlx::query_as(SCHEMAS_SQL).fetch_all(&mut conn).await?;
        let tables: Vec<(i64, String, i64)> =
            sqlx::query_as(TABLES_SQL).fetch_all(&mut conn).await?;
        conn.close().await?;

        let db = assemble_database(oid, name, schemas, tables)?;
        debug!(
            database = %db.name,
            schemas = db.schemas.len(),
            tables = db.schemas.iter().map(|s| s.tables.len()).sum::<usize>(),
            "fetched database catalog"
        );
        Ok(db)
    }
}

#[async_trait]
impl CatalogSource for PgCatalog {
    async fn fetch_snapshot(&self) -> Result<CatalogSnapshot> {
        let mut conn = self.connect(None).await?;
        let databases: Vec<(i64, String)> =
            sqlx::query_as(DATABASES_SQL).fetch_all(&mut conn).await?;
        conn.close().await?;

        let mut snapshot = CatalogSnapshot::default();
        for (oid, name) in databases {
            let oid = to_oid("database", oid)?;
            snapshot = snapshot.with_database(self.fetch_database(oid, name).await?);
        }

        info!(
            databases = snapshot.databases.len(),
            tables = snapshot.table_count(),
            "captured catalog snapshot"
        );
        Ok(snapshot)
    }

    async fn storage_root(&self) -> Result<Option<PathBuf>> {
        let mut conn = self.connect(None).await?;
        let (dir,): (String,) = sqlx::query_as("SHOW data_directory")
            .fetch_one(&mut conn)
            .await?;
        conn.close().await?;
        Ok(Some(PathBuf::from(dir)))
    }
}

/// Group raw catalog rows into one [`Database`].
///
/// Schema rows are `(oid, name)`; table rows are
/// `(namespace oid, name, filenode)`. Reserved schemas and their tables are
/// dropped.
fn assemble_database(
    oid: u32,
    name: String,
    schemas: Vec<(i64, String)>,
    tables: Vec<(i64, String, i64)>,
) -> Result<Database> {
    let mut by_oid: BTreeMap<i64, Schema> = BTreeMap::new();
    for (sch_oid, sch_name) in schemas {
        if is_reserved_schema(&sch_name) {
            continue;
        }
        by_oid.insert(sch_oid, Schema::new(to_oid("schema", sch_oid)?, sch_name));
    }

    for (namespace, rel_name, filenode) in tables {
        if let Some(sch) = by_oid.get_mut(&namespace) {
            sch.tables
                .push(Table::new(rel_name, to_oid("relfilenode", filenode)?));
        }
    }

    let mut db = Database::new(oid, name);
    db.schemas = by_oid.into_values().collect();
    Ok(db)
}

fn to_oid(what: &'static str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::OidOutOfRange { what, value })
}
