//! Asset inventory endpoints.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::Deserialize;
use steward_core::{
  asset::{Asset, AssetPatch},
  engine::NewAssetInput,
  store::{AssetQuery, AssetStore},
};
use uuid::Uuid;

use crate::{AppState, auth::Identity, error::ApiError, extract::ValidatedJson};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListParams {
  pub organization: Option<String>,
  pub name:         Option<String>,
  pub kind:         Option<String>,
  #[serde(default)]
  pub in_stock:     bool,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

impl From<ListParams> for AssetQuery {
  fn from(p: ListParams) -> Self {
    AssetQuery {
      organization: p.organization,
      name:         p.name,
      kind:         p.kind,
      in_stock:     p.in_stock,
      limit:        p.limit,
      offset:       p.offset,
    }
  }
}

pub async fn create<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
  ValidatedJson(input): ValidatedJson<NewAssetInput>,
) -> Result<(StatusCode, Json<Asset>), ApiError> {
  let asset = state.engine.create_asset(&caller, input).await?;
  Ok((StatusCode::CREATED, Json(asset)))
}

pub async fn list<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Asset>>, ApiError> {
  let assets = state.engine.list_assets(&caller, params.into()).await?;
  Ok(Json(assets))
}

pub async fn get_one<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(_caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Asset>, ApiError> {
  Ok(Json(state.engine.get_asset(id).await?))
}

pub async fn update<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
  ValidatedJson(patch): ValidatedJson<AssetPatch>,
) -> Result<Json<Asset>, ApiError> {
  let asset = state.engine.update_asset(&caller, id, patch).await?;
  Ok(Json(asset))
}

pub async fn delete<S: AssetStore>(
  State(state): State<AppState<S>>,
  Identity(caller): Identity,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  state.engine.delete_asset(&caller, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
