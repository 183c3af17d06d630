//! Request lifecycle endpoints.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use steward_core::{
  engine::SubmitInput,
  request::Request,
  store::AssetStore,
};
use uuid::Uuid;

use crate::{AppState, auth::Identity, error::ApiError, extract::ValidatedJson};

pub async fn create<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
  ValidatedJson(input): ValidatedJson<SubmitInput>,
) -> Result<(StatusCode, Json<Request>), ApiError> {
  let request = state.engine.submit(&caller, input).await?;
  Ok((StatusCode::CREATED, Json(request)))
}

/// All requests against the caller's organization. Admin only.
pub async fn list<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
) -> Result<Json<Vec<Request>>, ApiError> {
  Ok(Json(state.engine.list_requests(&caller).await?))
}

pub async fn mine<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
) -> Result<Json<Vec<Request>>, ApiError> {
  Ok(Json(state.engine.my_requests(&caller).await?))
}

pub async fn approve<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Request>, ApiError> {
  Ok(Json(state.engine.approve(&caller, id).await?))
}

pub async fn reject<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Request>, ApiError> {
  Ok(Json(state.engine.reject(&caller, id).await?))
}
