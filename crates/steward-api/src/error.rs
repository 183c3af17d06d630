//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use steward_core::Error as CoreError;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthenticated")]
  Unauthenticated,

  #[error("validation error: {0}")]
  Validation(String),

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthenticated => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthenticated" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Bearer realm=\"steward\""),
        );
        return res;
      }
      ApiError::Validation(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Core(e) => {
        if e.is_fatal() {
          // Manual reconciliation required; make sure it reaches the log.
          tracing::error!(error = %e, "inconsistent state escalated from engine");
        }
        (core_status(e), e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

fn core_status(e: &CoreError) -> StatusCode {
  match e {
    CoreError::AssetNotFound(_)
    | CoreError::RequestNotFound(_)
    | CoreError::AssignmentNotFound(_) => StatusCode::NOT_FOUND,
    CoreError::InvalidState { .. }
    | CoreError::InsufficientStock(_)
    | CoreError::AlreadyReturned(_)
    | CoreError::Conflict(_) => StatusCode::CONFLICT,
    CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
    CoreError::Inconsistent { .. } | CoreError::Store(_) => {
      StatusCode::INTERNAL_SERVER_ERROR
    }
  }
}
