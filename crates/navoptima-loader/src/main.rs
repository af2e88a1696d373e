//! `loader` binary.
//!
//! Reads the telemetry extract, opens the warehouse, runs one load and prints
//! the run report as JSON on stdout.
//!
//! ```
//! cargo run -p navoptima-loader --bin loader -- --extract data/processed/df_final_enriched.csv
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use navoptima_loader::{LoaderConfig, extract::read_extract};
use navoptima_store_sqlite::SqliteWarehouse;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "NavOptima warehouse loader")]
struct Cli {
  /// Path to an optional TOML configuration file.
  #[arg(short, long, default_value = "navoptima.toml")]
  config: PathBuf,

  /// CSV extract to load.
  #[arg(long)]
  extract: Option<PathBuf>,

  /// SQLite warehouse file.
  #[arg(long)]
  warehouse: Option<PathBuf>,

  /// Facts appended per transaction.
  #[arg(long)]
  batch_size: Option<usize>,

  /// Append every fact, even ones an earlier run already loaded.
  #[arg(long)]
  no_fact_dedup: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut cfg = LoaderConfig::load(Some(cli.config.as_path())).context("failed to load configuration")?;
  if let Some(extract) = cli.extract {
    cfg.extract_path = extract;
  }
  if let Some(warehouse) = cli.warehouse {
    cfg.warehouse_path = warehouse;
  }
  if let Some(batch_size) = cli.batch_size {
    cfg.batch_size = batch_size;
  }
  if cli.no_fact_dedup {
    cfg.fact_dedup = false;
  }
  cfg.validate()?;

  // The extract is read before the warehouse is touched, so a missing file
  // leaves no trace.
  let records = read_extract(&cfg.extract_path)?;
  tracing::info!(path = %cfg.extract_path.display(), rows = records.len(), "extract read");

  let warehouse = SqliteWarehouse::open(&cfg.warehouse_path)
    .await
    .with_context(|| format!("failed to open warehouse at {:?}", cfg.warehouse_path))?;

  let extract_path = cfg.extract_path.display().to_string();
  let report = navoptima_loader::run(&warehouse, &cfg, &extract_path, records).await?;

  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}
