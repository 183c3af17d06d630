//! Affiliation listing and employee offboarding.

use axum::{
  Json,
  extract::{Path, State},
};
use steward_core::{
  affiliation::Affiliation,
  engine::RemovalSummary,
  store::AssetStore,
};

use crate::{AppState, auth::Identity, error::ApiError};

/// Affiliations of the caller's organization, active and inactive. Admin only.
pub async fn affiliations<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
) -> Result<Json<Vec<Affiliation>>, ApiError> {
  Ok(Json(state.engine.list_affiliations(&caller).await?))
}

/// Offboard an employee: force-return their holdings and deactivate their
/// affiliation. Admin only.
pub async fn remove<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
  Path(identity): Path<String>,
) -> Result<Json<RemovalSummary>, ApiError> {
  Ok(Json(state.engine.remove_employee(&caller, &identity).await?))
}
