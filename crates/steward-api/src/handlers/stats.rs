//! Reporting endpoints.

use axum::{
  Json,
  extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use steward_core::{asset::Asset, store::AssetStore};

use crate::{AppState, auth::Identity, error::ApiError};

fn default_limit() -> usize { 5 }

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopParams {
  #[serde(default = "default_limit")]
  pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct TopEntry {
  pub asset:         Asset,
  pub request_count: u64,
}

/// Most-requested assets of the caller's organization. Admin only.
pub async fn top_requested<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
  Query(params): Query<TopParams>,
) -> Result<Json<Vec<TopEntry>>, ApiError> {
  let ranked = state.engine.top_requested(&caller, params.limit).await?;
  let entries = ranked
    .into_iter()
    .map(|(asset, request_count)| TopEntry { asset, request_count })
    .collect();
  Ok(Json(entries))
}
