//! Error types shared by the backend clients and the HTTP handlers.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
  /// The backend could not be reached or the body could not be read.
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  /// The backend answered with a non-success status and no usable body.
  #[error("backend returned {status}: {body}")]
  Status { status: u16, body: String },

  /// The backend body did not match the expected shape.
  #[error("unexpected response: {0}")]
  Decode(String),

  /// The request is missing required fields.
  #[error("invalid request: {0}")]
  Validation(String),

  /// A page fetch failed; the message carries the page number.
  #[error("{0}")]
  Cache(String),

  #[error("xml error: {0}")]
  Xml(String),
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
  /// Short label placed in the `error` field of responses.
  fn label(&self) -> &'static str {
    match self {
      Self::Transport(_) | Self::Status { .. } | Self::Decode(_) | Self::Xml(_) => {
        "Backend request failed"
      }
      Self::Validation(_) => "Invalid request",
      Self::Cache(_) => "Failed to load page",
    }
  }

  pub fn status_code(&self) -> StatusCode {
    match self {
      Self::Validation(_) => StatusCode::BAD_REQUEST,
      Self::Cache(_) => StatusCode::BAD_GATEWAY,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<quick_xml::Error> for GatewayError {
  fn from(e: quick_xml::Error) -> Self {
    Self::Xml(e.to_string())
  }
}

impl From<QueryRejection> for GatewayError {
  fn from(rejection: QueryRejection) -> Self {
    Self::Validation(rejection.body_text())
  }
}

impl IntoResponse for GatewayError {
  fn into_response(self) -> Response {
    let body = json!({
      "error": self.label(),
      "details": self.to_string(),
    });
    (self.status_code(), Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_codes() {
    assert_eq!(
      GatewayError::Validation("x".into()).status_code(),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      GatewayError::Cache("Failed to load page 2: boom".into()).status_code(),
      StatusCode::BAD_GATEWAY
    );
    assert_eq!(
      GatewayError::Decode("x".into()).status_code(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[test]
  fn test_cache_error_keeps_message() {
    let err = GatewayError::Cache("Failed to load page 3: timeout".into());
    assert_eq!(err.to_string(), "Failed to load page 3: timeout");
  }
}
