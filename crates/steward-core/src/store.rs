//! The `AssetStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `steward-store-sqlite`).
//! Higher layers (`steward-api`, the [`LifecycleEngine`]) depend on this
//! abstraction, not on any concrete backend.
//!
//! Methods are storage primitives, not business operations: conditional
//! single-record transitions plus plain inserts and reads. The
//! [`LifecycleEngine`](crate::engine::LifecycleEngine) composes them and owns
//! the invariants. The two contended primitives — [`AssetStore::reserve`] and
//! the conditional transitions — must be atomic with respect to concurrent
//! calls on the same record.

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
  affiliation::Affiliation,
  asset::{Asset, AssetPatch, NewAsset},
  assignment::{Assignment, NewAssignment},
  request::{Decision, NewRequest, Request},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Failure surfaced by a storage backend. Backend errors are retryable from
/// the caller's point of view; the engine itself never retries.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// Concurrent modification detected at the storage layer.
  #[error("conflict: {0}")]
  Conflict(String),
}

impl StoreError {
  pub fn backend(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Backend(Box::new(e))
  }
}

// ─── Outcomes and queries ────────────────────────────────────────────────────

/// Outcome of an atomic conditional decrement of `available_quantity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
  Reserved,
  InsufficientStock,
  NotFound,
}

/// Parameters for [`AssetStore::list_assets`].
#[derive(Debug, Clone, Default)]
pub struct AssetQuery {
  /// Restrict to a single organization's inventory.
  pub organization: Option<String>,
  /// Case-insensitive substring filter on the asset name.
  pub name:         Option<String>,
  /// Exact match on the asset kind.
  pub kind:         Option<String>,
  /// If `true`, only assets with `available_quantity >= 1`.
  pub in_stock:     bool,
  pub limit:        Option<usize>,
  pub offset:       Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Steward storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AssetStore: Send + Sync {
  // ── Assets ────────────────────────────────────────────────────────────

  /// Persist a new asset with `available_quantity = total_quantity`.
  fn insert_asset(
    &self,
    input: NewAsset,
  ) -> impl Future<Output = Result<Asset, StoreError>> + Send + '_;

  fn get_asset(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Asset>, StoreError>> + Send + '_;

  fn list_assets(
    &self,
    query: AssetQuery,
  ) -> impl Future<Output = Result<Vec<Asset>, StoreError>> + Send + '_;

  /// Apply a partial update. Returns `false` if the asset does not exist.
  ///
  /// A `total_quantity` change must shift `available_quantity` by the same
  /// delta, clamped to `[0, total_quantity]`, in the same atomic update.
  fn update_asset(
    &self,
    id: Uuid,
    patch: AssetPatch,
  ) -> impl Future<Output = Result<bool, StoreError>> + Send + '_;

  /// Returns `false` if the asset does not exist.
  fn delete_asset(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, StoreError>> + Send + '_;

  // ── Reservation ───────────────────────────────────────────────────────

  /// Atomically decrement `available_quantity` if it is at least 1.
  ///
  /// Concurrent calls against the same asset with `available_quantity = 1`
  /// must yield exactly one [`Reservation::Reserved`].
  fn reserve(
    &self,
    asset_id: Uuid,
  ) -> impl Future<Output = Result<Reservation, StoreError>> + Send + '_;

  /// Unconditional +1, capped at `total_quantity`. No-op if the asset is
  /// gone (it may have been deleted while assignments were outstanding).
  fn release(
    &self,
    asset_id: Uuid,
  ) -> impl Future<Output = Result<(), StoreError>> + Send + '_;

  // ── Requests ──────────────────────────────────────────────────────────

  /// Persist a new request in `Pending` state.
  fn insert_request(
    &self,
    input: NewRequest,
  ) -> impl Future<Output = Result<Request, StoreError>> + Send + '_;

  fn get_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Request>, StoreError>> + Send + '_;

  /// All requests whose owning organization matches, newest first.
  fn list_requests(
    &self,
    organization: String,
  ) -> impl Future<Output = Result<Vec<Request>, StoreError>> + Send + '_;

  /// All requests submitted by `employee`, newest first.
  fn list_requests_for_employee(
    &self,
    employee: String,
  ) -> impl Future<Output = Result<Vec<Request>, StoreError>> + Send + '_;

  /// Conditionally transition a request out of `Pending`, stamping decision
  /// metadata. Returns `false` if the request is missing or no longer
  /// pending — the caller distinguishes via [`AssetStore::get_request`].
  fn decide_request(
    &self,
    id: Uuid,
    decision: Decision,
    decided_by: String,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, StoreError>> + Send + '_;

  /// Compensating revert `Approved -> Pending`, clearing decision metadata.
  /// Used only by approval rollback. Returns `false` if the request is
  /// missing or not approved.
  fn reopen_request(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, StoreError>> + Send + '_;

  // ── Assignments ───────────────────────────────────────────────────────

  /// Persist a new assignment in `Assigned` state.
  fn insert_assignment(
    &self,
    input: NewAssignment,
  ) -> impl Future<Output = Result<Assignment, StoreError>> + Send + '_;

  fn get_assignment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Assignment>, StoreError>> + Send + '_;

  /// All assignments held by `employee` (any status), newest first.
  fn list_assignments_for_employee(
    &self,
    employee: String,
  ) -> impl Future<Output = Result<Vec<Assignment>, StoreError>> + Send + '_;

  /// Assignments in `Assigned` state for (employee, organization).
  fn list_active_assignments(
    &self,
    employee: String,
    organization: String,
  ) -> impl Future<Output = Result<Vec<Assignment>, StoreError>> + Send + '_;

  /// Conditionally transition `Assigned -> Returned`, stamping
  /// `returned_at`. Returns `false` if the assignment is missing or already
  /// returned.
  fn mark_returned(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, StoreError>> + Send + '_;

  /// Remove an assignment record. Used only by approval rollback.
  fn delete_assignment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, StoreError>> + Send + '_;

  // ── Affiliations ──────────────────────────────────────────────────────

  /// Create an `Active` affiliation for (employee, organization) unless any
  /// record — active or inactive — already exists for the pair. Returns
  /// `true` iff a new record was created. Never resurrects an inactive one.
  fn ensure_affiliation(
    &self,
    employee: String,
    organization: String,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, StoreError>> + Send + '_;

  /// Set the pair's affiliation `Inactive`. Returns `false` if no active
  /// record exists.
  fn deactivate_affiliation(
    &self,
    employee: String,
    organization: String,
  ) -> impl Future<Output = Result<bool, StoreError>> + Send + '_;

  fn list_affiliations(
    &self,
    organization: String,
  ) -> impl Future<Output = Result<Vec<Affiliation>, StoreError>> + Send + '_;

  // ── Stats ─────────────────────────────────────────────────────────────

  /// Assets of `organization` ranked by request count descending. Ties are
  /// broken by any stable order.
  fn top_requested_assets(
    &self,
    organization: String,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<(Asset, u64)>, StoreError>> + Send + '_;
}
