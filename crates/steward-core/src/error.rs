//! Error types for `steward-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{request::RequestStatus, store::StoreError};

#[derive(Debug, Error)]
pub enum Error {
  #[error("asset not found: {0}")]
  AssetNotFound(Uuid),

  #[error("request not found: {0}")]
  RequestNotFound(Uuid),

  #[error("assignment not found: {0}")]
  AssignmentNotFound(Uuid),

  /// A transition was attempted on a request that already left `Pending`.
  #[error("request {id} is not pending (status: {status})")]
  InvalidState { id: Uuid, status: RequestStatus },

  /// Reservation would push `available_quantity` below zero.
  #[error("insufficient stock for asset {0}")]
  InsufficientStock(Uuid),

  #[error("forbidden: {0}")]
  Forbidden(String),

  /// Idempotence guard: the assignment was already returned.
  #[error("assignment {0} is already returned")]
  AlreadyReturned(Uuid),

  #[error("conflict: {0}")]
  Conflict(String),

  /// Rollback of a partially-applied approval failed. Not recoverable by the
  /// engine; surfaced for manual reconciliation.
  #[error("inconsistent state after failed rollback of {op}: {detail}")]
  Inconsistent { op: &'static str, detail: String },

  #[error("store error: {0}")]
  Store(#[from] StoreError),
}

impl Error {
  /// True for the one error class the engine never attempts to recover from.
  pub fn is_fatal(&self) -> bool { matches!(self, Self::Inconsistent { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
