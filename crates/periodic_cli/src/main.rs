use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use periodic_core::{CatalogConfig, SqliteBlobStore};

mod commands;

use commands::CliError;

const DEFAULT_DB_FILE: &str = "periodic_table.sqlite3";

/// periodic: inspect and patch a periodic table catalog.
///
/// The catalog is one JSON document stored in a local SQLite blob store.
/// Updates are conditional on the revision read, so a concurrent writer
/// makes `patch` fail with a conflict instead of losing its change.
#[derive(Parser)]
#[command(name = "periodic", version, about, long_about = None)]
struct Cli {
    /// SQLite blob store file. Defaults to $PERIODIC_TABLE_DB or ./periodic_table.sqlite3.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Bucket holding the catalog. Defaults to $PERIODIC_TABLE_BUCKET.
    #[arg(long, global = true)]
    bucket: Option<String>,

    /// Object key of the catalog. Defaults to $PERIODIC_TABLE_KEY.
    #[arg(long, global = true)]
    key: Option<String>,

    /// Write rolling log files to this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level used with --log-dir.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the stored catalog with a JSON array read from FILE.
    Seed {
        /// Path to a JSON catalog file.
        file: PathBuf,
    },

    /// List elements, optionally filtered by group (1-18, n/a) or block (e.g. p-block).
    List {
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Show one element by atomic number.
    Get {
        atomic_number: u32,
    },

    /// Apply a JSON array of patch requests read from FILE in one conditional write.
    Patch {
        /// Path to a JSON file such as `[{"atomicNumber": 1, "name": "Hydrogen"}]`.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("error: {err} (kind={})", err.kind());
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Some(log_dir) = &cli.log_dir {
        init_logging(log_dir, cli.log_level.as_deref())?;
    }

    let config = resolve_config(&cli)?;
    let db_path = config
        .db_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
    let store = SqliteBlobStore::open(&db_path)?;

    match cli.command {
        Commands::Seed { file } => commands::seed(store, &config, &file).await,
        Commands::List { group } => commands::list(store, &config, group.as_deref()).await,
        Commands::Get { atomic_number } => commands::get(store, &config, atomic_number).await,
        Commands::Patch { file } => commands::patch(store, &config, &file).await,
    }
}

fn resolve_config(cli: &Cli) -> Result<CatalogConfig, CliError> {
    let mut config = CatalogConfig::from_env()?;
    if let Some(bucket) = &cli.bucket {
        config = config.with_bucket(bucket)?;
    }
    if let Some(key) = &cli.key {
        config = config.with_key(key)?;
    }
    if let Some(db) = &cli.db {
        config = config.with_db_path(db.clone());
    }
    Ok(config)
}

fn init_logging(log_dir: &Path, level: Option<&str>) -> Result<(), CliError> {
    let log_dir = if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(log_dir)
    };
    let level = level.unwrap_or_else(|| periodic_core::default_log_level());
    periodic_core::init_logging(level, &log_dir.to_string_lossy()).map_err(CliError::Logging)
}
