//! Body extraction with a uniform validation-error envelope.

use axum::{
  Json,
  extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Like [`axum::Json`], but maps deserialisation failures (unknown or
/// missing fields included) to [`ApiError::Validation`] so every rejection
/// shares the same JSON error envelope.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
  S: Send + Sync,
  T: DeserializeOwned,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<T>::from_request(req, state)
      .await
      .map_err(|e| ApiError::Validation(e.body_text()))?;
    Ok(ValidatedJson(value))
  }
}
