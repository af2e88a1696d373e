//! Route handlers.
//!
//! | Method | Path       | Notes |
//! |--------|------------|-------|
//! | `GET`  | `/`        | Service banner |
//! | `GET`  | `/health`  | `healthy` or `degraded` |
//! | `POST` | `/predict` | 503 without a model, 422 on bad input |

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// Fixed confidence reported with every prediction.
pub const CONFIDENCE_SCORE: f64 = 0.95;

// ─── Root ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceInfo {
  pub message: String,
  pub version: String,
}

/// `GET /`
pub async fn root() -> Json<ServiceInfo> {
  Json(ServiceInfo {
    message: "NavOptima AI Service is Running".to_owned(),
    version: env!("CARGO_PKG_VERSION").to_owned(),
  })
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
  pub status:       String,
  pub model_loaded: bool,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Health> {
  let loaded = state.model.is_loaded();
  Json(Health {
    status:       if loaded { "healthy" } else { "degraded" }.to_owned(),
    model_loaded: loaded,
  })
}

// ─── Predict ─────────────────────────────────────────────────────────────────

/// Body of `POST /predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoyageParameters {
  /// Speed over ground, knots.
  pub sog:         f64,
  /// Draft, metres.
  pub draft:       f64,
  /// Length overall, metres.
  pub length:      f64,
  /// Wind speed, m/s.
  pub wind_speed:  f64,
  /// Significant wave height, metres.
  pub wave_height: f64,
}

impl VoyageParameters {
  /// Check ranges and lay the values out in model feature order.
  pub fn features(&self) -> Result<[f64; 5], ApiError> {
    let positive = [("sog", self.sog), ("draft", self.draft), ("length", self.length)];
    let non_negative = [("wind_speed", self.wind_speed), ("wave_height", self.wave_height)];

    if let Some((name, v)) = positive.iter().find(|(_, v)| !v.is_finite() || *v <= 0.0) {
      return Err(ApiError::Validation(format!("{name} must be greater than 0, got {v}")));
    }
    if let Some((name, v)) = non_negative.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
      return Err(ApiError::Validation(format!(
        "{name} must be greater than or equal to 0, got {v}"
      )));
    }
    Ok([self.sog, self.draft, self.length, self.wind_speed, self.wave_height])
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Prediction {
  pub fuel_consumption_kgh: f64,
  pub confidence_score:     f64,
}

/// `POST /predict`
pub async fn predict(
  State(state): State<AppState>,
  body: Result<Json<VoyageParameters>, JsonRejection>,
) -> Result<Json<Prediction>, ApiError> {
  let Json(params) = body?;
  let features = params.features()?;

  let model = state.model.model().ok_or(ApiError::ModelUnavailable)?;
  let value = model.predict(&features).map_err(|e| {
    tracing::error!(error = %e, ?params, "inference failed");
    ApiError::from(e)
  })?;

  Ok(Json(Prediction {
    fuel_consumption_kgh: (value * 100.0).round() / 100.0,
    confidence_score:     CONFIDENCE_SCORE,
  }))
}
