//! Assignment endpoints.

use axum::{
  Json,
  extract::{Path, State},
};
use steward_core::{assignment::Assignment, store::AssetStore};
use uuid::Uuid;

use crate::{AppState, auth::Identity, error::ApiError};

pub async fn mine<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
) -> Result<Json<Vec<Assignment>>, ApiError> {
  Ok(Json(state.engine.my_assignments(&caller).await?))
}

/// Return a held asset. The holder may return their own assignment; an admin
/// of the owning organization may force a return.
pub async fn finish<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Assignment>, ApiError> {
  Ok(Json(state.engine.return_assignment(&caller, id).await?))
}
