//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;

/// pgfs - Mirror a PostgreSQL catalog as a tree of directories and hard links
///
/// Builds <DEST>/<database>/<schema>/<table>, each table a hard link to its
/// storage file, and keeps it in sync on every run. Connection settings come
/// from the usual libpq environment (PGHOST, PGPORT, PGUSER, PGDATABASE, ...).
#[derive(Parser, Debug)]
#[command(name = "pgfs")]
#[command(author, version)]
pub struct Cli {
    /// Destination root of the mirror tree
    pub dest: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Data directory to resolve table files under (default: ask the server)
    #[arg(long, env = "PGFS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Read the catalog from a JSON snapshot instead of connecting
    #[arg(long, env = "PGFS_SNAPSHOT", requires = "data_dir")]
    pub snapshot: Option<PathBuf>,

    /// Print the catalog tree before mirroring
    #[arg(long)]
    pub print: bool,

    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,
}
