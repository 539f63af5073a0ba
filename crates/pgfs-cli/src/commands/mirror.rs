//! Mirror command implementation
//!
//! Captures one catalog snapshot, then hands it to the guarded mirror run.

use std::path::{Path, PathBuf};

use colored::Colorize;

use pgfs_catalog::{CatalogSource, PgCatalog, SnapshotFile};
use pgfs_core::{CatalogSnapshot, SyncReport, mirror};

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Inputs of one mirror run
#[derive(Debug, Clone)]
pub struct MirrorArgs {
    pub dest: PathBuf,
    pub data_dir: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub print: bool,
    pub json: bool,
}

impl From<Cli> for MirrorArgs {
    fn from(cli: Cli) -> Self {
        Self {
            dest: cli.dest,
            data_dir: cli.data_dir,
            snapshot: cli.snapshot,
            print: cli.print,
            json: cli.json,
        }
    }
}

/// Run the mirror command
///
/// Fetches the snapshot, mirrors it into `args.dest` and prints the report.
pub fn run_mirror(args: &MirrorArgs) -> Result<SyncReport> {
    let source: Box<dyn CatalogSource> = match &args.snapshot {
        Some(path) => Box::new(SnapshotFile::new(path)),
        None => Box::new(PgCatalog::from_env()),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let (snapshot, storage_root) =
        runtime.block_on(capture(source.as_ref(), args.data_dir.as_deref()))?;

    if args.print {
        print!("{}", snapshot);
    }

    let report = mirror::run(&snapshot, &args.dest, &storage_root)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&args.dest, &report);
    }
    Ok(report)
}

/// Capture the snapshot and the storage root it resolves under.
async fn capture(
    source: &dyn CatalogSource,
    data_dir: Option<&Path>,
) -> Result<(CatalogSnapshot, PathBuf)> {
    let storage_root = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => source.storage_root().await?.ok_or_else(|| {
            CliError::user("the catalog source does not know its data directory; pass --data-dir")
        })?,
    };
    let snapshot = source.fetch_snapshot().await?;
    Ok((snapshot, storage_root))
}

fn print_summary(dest: &Path, report: &SyncReport) {
    if report.is_noop() {
        println!(
            "{} {} is already up to date.",
            "OK".green().bold(),
            dest.display()
        );
    } else {
        println!(
            "{} Synchronized {}: {} created, {} repaired, {} pruned",
            "OK".green().bold(),
            dest.display(),
            report.created,
            report.repaired,
            report.pruned
        );
    }
    if report.skipped > 0 {
        println!(
            "{} {} catalog entries have names that cannot be mirrored (run with --verbose for details)",
            "WARN".yellow().bold(),
            report.skipped
        );
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pgfs_test_utils::TestCluster;

    const SNAPSHOT: &str = r#"{"databases": [{"oid": 16384, "name": "shop", "schemas": [
        {"oid": 2200, "name": "public", "tables": [{"name": "orders", "filenode": 16385}]}
    ]}]}"#;

    fn args(cluster: &TestCluster) -> MirrorArgs {
        MirrorArgs {
            dest: cluster.mirror_root(),
            data_dir: Some(cluster.storage_root()),
            snapshot: Some(cluster.write_file("snapshot.json", SNAPSHOT)),
            print: false,
            json: false,
        }
    }

    #[test]
    fn test_mirror_from_snapshot_file() {
        let cluster = TestCluster::new();
        cluster.create_relation(16384, 16385);

        let report = run_mirror(&args(&cluster)).unwrap();

        assert_eq!(report.created, 3);
        cluster.assert_linked("shop/public/orders", 16384, 16385);
    }

    #[test]
    fn test_second_mirror_is_noop() {
        let cluster = TestCluster::new();
        cluster.create_relation(16384, 16385);

        run_mirror(&args(&cluster)).unwrap();
        let report = run_mirror(&args(&cluster)).unwrap();

        assert!(report.is_noop());
    }

    #[test]
    fn test_snapshot_without_data_dir_is_user_error() {
        let cluster = TestCluster::new();
        let mut args = args(&cluster);
        args.data_dir = None;

        let err = run_mirror(&args).unwrap_err();

        assert!(matches!(err, CliError::User { .. }), "got: {:?}", err);
        assert!(!cluster.mirror_root().exists());
    }
}
