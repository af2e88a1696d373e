//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::model::ModelError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("model not available")]
  ModelUnavailable,

  /// The body parsed but a value is out of range.
  #[error("{0}")]
  Validation(String),

  /// The body is not valid JSON for the endpoint.
  #[error(transparent)]
  Body(#[from] JsonRejection),

  #[error("inference failed: {0}")]
  Inference(#[from] ModelError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::ModelUnavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
      ApiError::Validation(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Body(rejection) => (rejection.status(), rejection.body_text()),
      // Details go to the log, not the caller.
      ApiError::Inference(_) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal error during inference".to_owned(),
      ),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
