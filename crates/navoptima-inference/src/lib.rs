//! HTTP inference service for NavOptima fuel-consumption predictions.
//!
//! The model is loaded once at startup into a [`ModelState`] and shared with
//! every handler through [`AppState`]. A missing or unreadable model does not
//! stop the service; it runs degraded and `/predict` answers 503.

pub mod error;
pub mod handlers;
pub mod model;

pub use error::ApiError;
pub use model::{BoosterModel, ModelError};

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime service configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
  pub host:                String,
  pub port:                u16,
  /// Tried first.
  pub model_path:          PathBuf,
  /// Tried when nothing exists at `model_path`.
  pub fallback_model_path: PathBuf,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      host:                "0.0.0.0".to_owned(),
      port:                8000,
      model_path:          PathBuf::from("/app/models/xgb_navoptima_v1.json"),
      fallback_model_path: PathBuf::from("models/xgb_navoptima_v1.json"),
    }
  }
}

impl ServiceConfig {
  /// Build from defaults, the optional TOML file at `path`, and `NAVOPTIMA_*`
  /// environment variables.
  pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
      builder = builder.add_source(config::File::from(path).required(false));
    }
    builder
      .add_source(config::Environment::with_prefix("NAVOPTIMA").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  /// Model paths in the order they are tried.
  pub fn model_candidates(&self) -> [PathBuf; 2] {
    [self.model_path.clone(), self.fallback_model_path.clone()]
  }
}

// ─── Model state ──────────────────────────────────────────────────────────────

/// Whether the service has a model to predict with.
#[derive(Debug)]
pub enum ModelState {
  Loaded { model: BoosterModel, path: PathBuf },
  Unavailable { reason: String },
}

impl ModelState {
  /// Load the model from the first of `candidates` that exists. Later
  /// candidates are not tried if that one fails to parse.
  pub fn load(candidates: &[PathBuf]) -> Self {
    let Some(path) = candidates.iter().find(|p| p.is_file()) else {
      let reason = format!("no model file found at {candidates:?}");
      tracing::error!("{reason}; starting degraded");
      return Self::Unavailable { reason };
    };

    tracing::info!(path = %path.display(), "loading model");
    match BoosterModel::load(path) {
      Ok(model) => {
        tracing::info!(
          path = %path.display(),
          trees = model.num_trees(),
          features = model.num_features(),
          objective = model.objective(),
          "model loaded"
        );
        Self::Loaded { model, path: path.clone() }
      }
      Err(e) => {
        tracing::error!(path = %path.display(), error = %e, "model unreadable; starting degraded");
        Self::Unavailable { reason: e.to_string() }
      }
    }
  }

  pub fn model(&self) -> Option<&BoosterModel> {
    match self {
      Self::Loaded { model, .. } => Some(model),
      Self::Unavailable { .. } => None,
    }
  }

  pub fn is_loaded(&self) -> bool { self.model().is_some() }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
  pub model: Arc<ModelState>,
}

impl AppState {
  pub fn new(model: ModelState) -> Self { Self { model: Arc::new(model) } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the service router.
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(handlers::root))
    .route("/health", get(handlers::health))
    .route("/predict", post(handlers::predict))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
