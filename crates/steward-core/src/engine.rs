//! The request lifecycle engine — the orchestrator for submit / approve /
//! reject / return and employee removal.
//!
//! The engine owns the invariants; the store only provides atomic
//! single-record primitives. Approval applies its four side effects (request
//! transition, inventory decrement, assignment creation, affiliation upsert)
//! with compensating rollback: any failure after a step has applied undoes
//! the applied steps in reverse, and a rollback failure escalates to
//! [`Error::Inconsistent`] for manual reconciliation.
//!
//! The engine performs no retries. Store failures surface to the caller as
//! retryable [`StoreError`]s.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  affiliation::Affiliation,
  asset::{Asset, AssetPatch, NewAsset},
  assignment::{Assignment, NewAssignment},
  error::{Error, Result},
  identity::{Caller, Role},
  request::{Decision, NewRequest, Request, RequestStatus},
  store::{AssetQuery, AssetStore, Reservation},
};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input for [`LifecycleEngine::submit`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitInput {
  pub asset_id: Uuid,
  pub note:     Option<String>,
}

/// Input for [`LifecycleEngine::create_asset`]. Organization and creator are
/// taken from the calling admin, never from the body.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAssetInput {
  pub name:           String,
  pub image:          Option<String>,
  pub kind:           String,
  pub total_quantity: u32,
}

/// What [`LifecycleEngine::remove_employee`] actually did.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct RemovalSummary {
  /// Assignments force-returned (inventory released once per assignment).
  pub returned:                usize,
  /// Whether an active affiliation existed and was set inactive.
  pub affiliation_deactivated: bool,
}

// ─── Policy hook ─────────────────────────────────────────────────────────────

/// Optional veto hook run on `approve` before any mutation.
///
/// Deployments that enforce an employee quota (or any other HR policy) plug
/// it in here; the default engine carries none.
pub trait ApprovalPolicy: Send + Sync {
  fn authorize(&self, admin: &Caller, request: &Request) -> Result<()>;
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The lifecycle engine. Cheap to clone; generic over the storage backend.
pub struct LifecycleEngine<S> {
  store:  Arc<S>,
  policy: Option<Arc<dyn ApprovalPolicy>>,
}

impl<S> Clone for LifecycleEngine<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      policy: self.policy.clone(),
    }
  }
}

impl<S: AssetStore> LifecycleEngine<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, policy: None }
  }

  pub fn with_policy(store: Arc<S>, policy: Arc<dyn ApprovalPolicy>) -> Self {
    Self { store, policy: Some(policy) }
  }

  // ── Requests ──────────────────────────────────────────────────────────

  /// Submit a request for an asset.
  ///
  /// Stock is *not* reserved here — requests are advisory until approved.
  /// The insufficient-stock check is a courtesy rejection of requests that
  /// cannot currently be satisfied.
  pub async fn submit(&self, caller: &Caller, input: SubmitInput) -> Result<Request> {
    let asset = self
      .store
      .get_asset(input.asset_id)
      .await?
      .ok_or(Error::AssetNotFound(input.asset_id))?;

    if asset.available_quantity < 1 {
      return Err(Error::InsufficientStock(asset.asset_id));
    }

    let request = self
      .store
      .insert_request(NewRequest {
        asset_id:     asset.asset_id,
        asset:        asset.snapshot(),
        requester:    caller.identity.clone(),
        organization: asset.organization.clone(),
        note:         input.note,
      })
      .await?;

    Ok(request)
  }

  /// Approve a pending request, applying all four side effects as one
  /// logical unit.
  pub async fn approve(&self, admin: &Caller, request_id: Uuid) -> Result<Request> {
    let request = self.load_for_decision(admin, request_id).await?;

    // The asset must still exist before we commit to the transition.
    self
      .store
      .get_asset(request.asset_id)
      .await?
      .ok_or(Error::AssetNotFound(request.asset_id))?;

    if let Some(policy) = &self.policy {
      policy.authorize(admin, &request)?;
    }

    let now = Utc::now();

    // Serialisation point: exactly one concurrent approve/reject of this
    // request wins the conditional transition.
    let won = self
      .store
      .decide_request(request_id, Decision::Approved, admin.identity.clone(), now)
      .await?;
    if !won {
      return Err(self.lost_transition(request_id).await);
    }

    match self.store.reserve(request.asset_id).await? {
      Reservation::Reserved => {}
      outcome => {
        self.reopen_or_escalate(request_id).await?;
        return Err(match outcome {
          Reservation::InsufficientStock => Error::InsufficientStock(request.asset_id),
          _ => Error::AssetNotFound(request.asset_id),
        });
      }
    }

    let assignment = match self
      .store
      .insert_assignment(NewAssignment {
        asset_id:     request.asset_id,
        asset:        request.asset.clone(),
        employee:     request.requester.clone(),
        organization: request.organization.clone(),
      })
      .await
    {
      Ok(a) => a,
      Err(e) => {
        self.rollback_approval(request_id, request.asset_id, None).await?;
        return Err(e.into());
      }
    };

    // First-write-wins: a no-op if any record (active or inactive) exists
    // for the pair.
    if let Err(e) = self
      .store
      .ensure_affiliation(request.requester.clone(), request.organization.clone(), now)
      .await
    {
      self
        .rollback_approval(request_id, request.asset_id, Some(assignment.assignment_id))
        .await?;
      return Err(e.into());
    }

    Ok(Request {
      status:     RequestStatus::Approved,
      decided_at: Some(now),
      decided_by: Some(admin.identity.clone()),
      ..request
    })
  }

  /// Reject a pending request. No inventory or affiliation side effects.
  pub async fn reject(&self, admin: &Caller, request_id: Uuid) -> Result<Request> {
    let request = self.load_for_decision(admin, request_id).await?;

    let now = Utc::now();
    let won = self
      .store
      .decide_request(request_id, Decision::Rejected, admin.identity.clone(), now)
      .await?;
    if !won {
      return Err(self.lost_transition(request_id).await);
    }

    Ok(Request {
      status:     RequestStatus::Rejected,
      decided_at: Some(now),
      decided_by: Some(admin.identity.clone()),
      ..request
    })
  }

  /// All requests for the admin's organization.
  pub async fn list_requests(&self, admin: &Caller) -> Result<Vec<Request>> {
    admin.require_admin()?;
    Ok(self.store.list_requests(admin.organization.clone()).await?)
  }

  /// The caller's own requests, across organizations.
  pub async fn my_requests(&self, caller: &Caller) -> Result<Vec<Request>> {
    Ok(
      self
        .store
        .list_requests_for_employee(caller.identity.clone())
        .await?,
    )
  }

  // ── Assignments ───────────────────────────────────────────────────────

  /// Return a checked-out asset, releasing its inventory slot.
  ///
  /// Permitted for the holding employee and for admins of the owning
  /// organization. Returning twice fails [`Error::AlreadyReturned`] and
  /// never double-increments inventory.
  pub async fn return_assignment(
    &self,
    caller: &Caller,
    assignment_id: Uuid,
  ) -> Result<Assignment> {
    let assignment = self
      .store
      .get_assignment(assignment_id)
      .await?
      .ok_or(Error::AssignmentNotFound(assignment_id))?;

    let permitted = caller.identity == assignment.employee
      || (caller.role == Role::Admin && caller.organization == assignment.organization);
    if !permitted {
      return Err(Error::Forbidden(
        "only the holder or an admin of the owning organization may return".into(),
      ));
    }

    if !assignment.status.is_assigned() {
      return Err(Error::AlreadyReturned(assignment_id));
    }

    let now = Utc::now();
    // Conditional transition guards against a concurrent return.
    if !self.store.mark_returned(assignment_id, now).await? {
      return Err(Error::AlreadyReturned(assignment_id));
    }

    // The assignment is already marked returned; a release failure here
    // leaves stock unaccounted for and there is no inverse transition.
    if let Err(e) = self.store.release(assignment.asset_id).await {
      return Err(Error::Inconsistent {
        op:     "return",
        detail: format!(
          "assignment {assignment_id} marked returned but release of asset {} failed: {e}",
          assignment.asset_id
        ),
      });
    }

    Ok(Assignment {
      status:      crate::assignment::AssignmentStatus::Returned,
      returned_at: Some(now),
      ..assignment
    })
  }

  /// All assignments held by the caller, any status.
  pub async fn my_assignments(&self, caller: &Caller) -> Result<Vec<Assignment>> {
    Ok(
      self
        .store
        .list_assignments_for_employee(caller.identity.clone())
        .await?,
    )
  }

  // ── Employees ─────────────────────────────────────────────────────────

  /// Remove an employee from the admin's organization: force-return every
  /// assigned asset, then deactivate the affiliation. The two effects belong
  /// to this single operation so an active affiliation can never dangle with
  /// no assignments behind it.
  pub async fn remove_employee(
    &self,
    admin: &Caller,
    employee: &str,
  ) -> Result<RemovalSummary> {
    admin.require_admin()?;

    let active = self
      .store
      .list_active_assignments(employee.to_owned(), admin.organization.clone())
      .await?;

    let mut returned = 0;
    for assignment in active {
      let now = Utc::now();
      // A concurrent self-return loses nothing; skip without releasing.
      if self.store.mark_returned(assignment.assignment_id, now).await? {
        if let Err(e) = self.store.release(assignment.asset_id).await {
          return Err(Error::Inconsistent {
            op:     "remove-employee",
            detail: format!(
              "assignment {} marked returned but release of asset {} failed: {e}",
              assignment.assignment_id, assignment.asset_id
            ),
          });
        }
        returned += 1;
      }
    }

    let deactivated = self
      .store
      .deactivate_affiliation(employee.to_owned(), admin.organization.clone())
      .await?;

    Ok(RemovalSummary { returned, affiliation_deactivated: deactivated })
  }

  /// Affiliations (active and inactive) for the admin's organization.
  pub async fn list_affiliations(&self, admin: &Caller) -> Result<Vec<Affiliation>> {
    admin.require_admin()?;
    Ok(self.store.list_affiliations(admin.organization.clone()).await?)
  }

  // ── Stats ─────────────────────────────────────────────────────────────

  /// Assets of the admin's organization ranked by request count descending.
  pub async fn top_requested(
    &self,
    admin: &Caller,
    limit: usize,
  ) -> Result<Vec<(Asset, u64)>> {
    admin.require_admin()?;
    Ok(
      self
        .store
        .top_requested_assets(admin.organization.clone(), limit)
        .await?,
    )
  }

  // ── Asset CRUD ────────────────────────────────────────────────────────

  pub async fn create_asset(&self, admin: &Caller, input: NewAssetInput) -> Result<Asset> {
    admin.require_admin()?;
    Ok(
      self
        .store
        .insert_asset(NewAsset {
          name:           input.name,
          image:          input.image,
          kind:           input.kind,
          total_quantity: input.total_quantity,
          organization:   admin.organization.clone(),
          added_by:       admin.identity.clone(),
        })
        .await?,
    )
  }

  pub async fn get_asset(&self, id: Uuid) -> Result<Asset> {
    self
      .store
      .get_asset(id)
      .await?
      .ok_or(Error::AssetNotFound(id))
  }

  /// Browse assets. Admins are scoped to their own organization; members may
  /// browse any inventory (a member requests before being affiliated).
  pub async fn list_assets(&self, caller: &Caller, mut query: AssetQuery) -> Result<Vec<Asset>> {
    if caller.is_admin() {
      query.organization = Some(caller.organization.clone());
    }
    Ok(self.store.list_assets(query).await?)
  }

  pub async fn update_asset(
    &self,
    admin: &Caller,
    id: Uuid,
    patch: AssetPatch,
  ) -> Result<Asset> {
    admin.require_admin()?;
    let asset = self
      .store
      .get_asset(id)
      .await?
      .ok_or(Error::AssetNotFound(id))?;
    if asset.organization != admin.organization {
      return Err(Error::Forbidden("asset belongs to another organization".into()));
    }

    if !self.store.update_asset(id, patch).await? {
      // Deleted between the read and the write.
      return Err(Error::Conflict(format!("asset {id} was deleted concurrently")));
    }

    self
      .store
      .get_asset(id)
      .await?
      .ok_or(Error::Conflict(format!("asset {id} was deleted concurrently")))
  }

  /// Delete an asset. Ownership is the creating admin, not just any admin of
  /// the organization.
  pub async fn delete_asset(&self, admin: &Caller, id: Uuid) -> Result<()> {
    admin.require_admin()?;
    let asset = self
      .store
      .get_asset(id)
      .await?
      .ok_or(Error::AssetNotFound(id))?;
    if asset.added_by != admin.identity {
      return Err(Error::Forbidden("only the admin who added the asset may delete it".into()));
    }

    if !self.store.delete_asset(id).await? {
      return Err(Error::AssetNotFound(id));
    }
    Ok(())
  }

  // ── Internals ─────────────────────────────────────────────────────────

  /// Common preamble for approve/reject: load, authorize, check pending.
  async fn load_for_decision(&self, admin: &Caller, request_id: Uuid) -> Result<Request> {
    admin.require_admin()?;

    let request = self
      .store
      .get_request(request_id)
      .await?
      .ok_or(Error::RequestNotFound(request_id))?;

    if request.organization != admin.organization {
      return Err(Error::Forbidden("request belongs to another organization".into()));
    }
    if !request.status.is_pending() {
      return Err(Error::InvalidState { id: request_id, status: request.status });
    }

    Ok(request)
  }

  /// Build the error for a conditional transition we did not win.
  async fn lost_transition(&self, request_id: Uuid) -> Error {
    let status = match self.store.get_request(request_id).await {
      Ok(Some(r)) => r.status,
      // The request vanished or the read failed; report the transition
      // failure rather than masking it with a read error.
      _ => RequestStatus::Pending,
    };
    Error::InvalidState { id: request_id, status }
  }

  /// Revert an approval's request transition, escalating if the revert
  /// cannot be applied.
  async fn reopen_or_escalate(&self, request_id: Uuid) -> Result<()> {
    match self.store.reopen_request(request_id).await {
      Ok(true) => Ok(()),
      Ok(false) => Err(Error::Inconsistent {
        op:     "approve",
        detail: format!("request {request_id} could not be reopened"),
      }),
      Err(e) => Err(Error::Inconsistent {
        op:     "approve",
        detail: format!("reopening request {request_id} failed: {e}"),
      }),
    }
  }

  /// Undo an approval's applied side effects in reverse order.
  async fn rollback_approval(
    &self,
    request_id: Uuid,
    asset_id: Uuid,
    assignment_id: Option<Uuid>,
  ) -> Result<()> {
    if let Some(id) = assignment_id {
      if let Err(e) = self.store.delete_assignment(id).await {
        return Err(Error::Inconsistent {
          op:     "approve",
          detail: format!("deleting assignment {id} during rollback failed: {e}"),
        });
      }
    }
    if let Err(e) = self.store.release(asset_id).await {
      return Err(Error::Inconsistent {
        op:     "approve",
        detail: format!("releasing asset {asset_id} during rollback failed: {e}"),
      });
    }
    self.reopen_or_escalate(request_id).await
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
