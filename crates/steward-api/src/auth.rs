//! Bearer-token access gate and axum extractor.
//!
//! Token issuance and verification mechanics are an external concern; this
//! module only resolves an already-issued credential to a [`Caller`]. The
//! shipped [`TokenGate`] is a static table loaded from configuration.

use std::collections::HashMap;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::Deserialize;
use steward_core::{
  identity::{Caller, Role},
  store::AssetStore,
};

use crate::{AppState, error::ApiError};

/// Resolves a bearer credential to a caller identity.
pub trait AccessGate: Send + Sync {
  /// `None` means the credential is unknown or expired.
  fn identify(&self, credential: &str) -> Option<Caller>;
}

/// One configured credential for [`TokenGate`].
#[derive(Debug, Clone, Deserialize)]
pub struct TokenEntry {
  pub token:        String,
  pub identity:     String,
  pub organization: String,
  pub role:         Role,
}

/// A static token table. Fine for deployments fronted by a real identity
/// provider issuing long-lived service tokens.
pub struct TokenGate {
  tokens: HashMap<String, Caller>,
}

impl TokenGate {
  pub fn new(entries: impl IntoIterator<Item = TokenEntry>) -> Self {
    let tokens = entries
      .into_iter()
      .map(|e| {
        (
          e.token,
          Caller {
            identity:     e.identity,
            organization: e.organization,
            role:         e.role,
          },
        )
      })
      .collect();
    Self { tokens }
  }
}

impl AccessGate for TokenGate {
  fn identify(&self, credential: &str) -> Option<Caller> {
    self.tokens.get(credential).cloned()
  }
}

/// Extractor: the authenticated caller, resolved from the `Authorization:
/// Bearer` header. Rejects with 401 when the header is missing, malformed,
/// or unknown to the gate.
pub struct Identity(pub Caller);

impl<S> FromRequestParts<AppState<S>> for Identity
where
  S: AssetStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let header_val = parts
      .headers
      .get(axum::http::header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthenticated)?;

    let token = header_val
      .strip_prefix("Bearer ")
      .ok_or(ApiError::Unauthenticated)?;

    let caller = state
      .gate
      .identify(token)
      .ok_or(ApiError::Unauthenticated)?;

    Ok(Identity(caller))
  }
}
