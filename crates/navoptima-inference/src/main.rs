//! Inference server binary.
//!
//! Loads the model (primary path, then fallback), then serves the prediction
//! API over HTTP. Starts degraded when no model can be loaded.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use navoptima_inference::{AppState, ModelState, ServiceConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "NavOptima inference server")]
struct Cli {
  /// Path to an optional TOML configuration file.
  #[arg(short, long, default_value = "navoptima.toml")]
  config: PathBuf,

  /// Address to bind.
  #[arg(long)]
  host: Option<String>,

  #[arg(short, long)]
  port: Option<u16>,

  /// Model file to try first.
  #[arg(long)]
  model: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut cfg =
    ServiceConfig::load(Some(cli.config.as_path())).context("failed to load configuration")?;
  if let Some(host) = cli.host {
    cfg.host = host;
  }
  if let Some(port) = cli.port {
    cfg.port = port;
  }
  if let Some(model) = cli.model {
    cfg.model_path = model;
  }

  // Loading finishes before the listener is bound.
  let state = AppState::new(ModelState::load(&cfg.model_candidates()));

  let app = navoptima_inference::router(state);
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  tracing::info!("inference service stopped");
  Ok(())
}
