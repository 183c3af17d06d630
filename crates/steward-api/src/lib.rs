//! JSON REST API for Steward.
//!
//! Exposes an axum [`Router`] backed by any [`steward_core::store::AssetStore`],
//! with bearer-token authentication resolved through an [`auth::AccessGate`].

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{delete, get, post},
};
use serde::Deserialize;
use steward_core::{engine::LifecycleEngine, store::AssetStore};
use tower_http::trace::TraceLayer;

use auth::{AccessGate, TokenEntry};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Credential table for the built-in [`auth::TokenGate`].
  #[serde(default)]
  pub tokens:     Vec<TokenEntry>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub engine: LifecycleEngine<S>,
  pub gate:   Arc<dyn AccessGate>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      engine: self.engine.clone(),
      gate:   Arc::clone(&self.gate),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router. Every route requires a bearer credential; role
/// checks happen inside the engine.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: AssetStore + 'static,
{
  use handlers::{assets, assignments, employees, requests, stats};

  Router::new()
    // Inventory
    .route("/assets", get(assets::list::<S>).post(assets::create::<S>))
    .route(
      "/assets/{id}",
      get(assets::get_one::<S>)
        .patch(assets::update::<S>)
        .delete(assets::delete::<S>),
    )
    // Requests
    .route("/requests", get(requests::list::<S>).post(requests::create::<S>))
    .route("/requests/mine", get(requests::mine::<S>))
    .route("/requests/{id}/approve", post(requests::approve::<S>))
    .route("/requests/{id}/reject", post(requests::reject::<S>))
    // Assignments
    .route("/assignments/mine", get(assignments::mine::<S>))
    .route("/assignments/{id}/return", post(assignments::finish::<S>))
    // Affiliations and offboarding
    .route("/affiliations", get(employees::affiliations::<S>))
    .route("/employees/{identity}", delete(employees::remove::<S>))
    // Stats
    .route("/stats/top-requested", get(stats::top_requested::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
