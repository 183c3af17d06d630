//! Integration tests for `SqliteStore` against an in-memory database,
//! driven through the lifecycle engine where the scenario calls for it.

use std::sync::Arc;

use steward_core::{
  Error,
  affiliation::AffiliationStatus,
  assignment::AssignmentStatus,
  engine::{LifecycleEngine, NewAssetInput, SubmitInput},
  identity::{Caller, Role},
  request::RequestStatus,
  store::{AssetQuery, AssetStore, Reservation},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn engine() -> LifecycleEngine<SqliteStore> {
  LifecycleEngine::new(Arc::new(store().await))
}

fn admin() -> Caller {
  Caller {
    identity:     "hr@acme.example".into(),
    organization: "acme".into(),
    role:         Role::Admin,
  }
}

fn member(identity: &str) -> Caller {
  Caller {
    identity:     identity.into(),
    organization: "acme".into(),
    role:         Role::Member,
  }
}

async fn seed_asset(
  engine: &LifecycleEngine<SqliteStore>,
  name: &str,
  total: u32,
) -> steward_core::asset::Asset {
  engine
    .create_asset(
      &admin(),
      NewAssetInput {
        name:           name.into(),
        image:          None,
        kind:           "laptop".into(),
        total_quantity: total,
      },
    )
    .await
    .unwrap()
}

async fn available(engine: &LifecycleEngine<SqliteStore>, id: Uuid) -> u32 {
  engine.get_asset(id).await.unwrap().available_quantity
}

// ─── Reservation primitives ──────────────────────────────────────────────────

#[tokio::test]
async fn reserve_decrements_until_empty() {
  let s = store().await;
  let asset = s
    .insert_asset(steward_core::asset::NewAsset {
      name:           "ThinkPad X1".into(),
      image:          None,
      kind:           "laptop".into(),
      total_quantity: 2,
      organization:   "acme".into(),
      added_by:       "hr@acme.example".into(),
    })
    .await
    .unwrap();

  assert_eq!(s.reserve(asset.asset_id).await.unwrap(), Reservation::Reserved);
  assert_eq!(s.reserve(asset.asset_id).await.unwrap(), Reservation::Reserved);
  assert_eq!(s.reserve(asset.asset_id).await.unwrap(), Reservation::InsufficientStock);

  let stored = s.get_asset(asset.asset_id).await.unwrap().unwrap();
  assert_eq!(stored.available_quantity, 0);
}

#[tokio::test]
async fn reserve_missing_asset_reports_not_found() {
  let s = store().await;
  assert_eq!(s.reserve(Uuid::new_v4()).await.unwrap(), Reservation::NotFound);
}

#[tokio::test]
async fn release_is_capped_at_total_quantity() {
  let s = store().await;
  let asset = s
    .insert_asset(steward_core::asset::NewAsset {
      name:           "Dock".into(),
      image:          None,
      kind:           "peripheral".into(),
      total_quantity: 1,
      organization:   "acme".into(),
      added_by:       "hr@acme.example".into(),
    })
    .await
    .unwrap();

  s.release(asset.asset_id).await.unwrap();
  s.release(asset.asset_id).await.unwrap();

  let stored = s.get_asset(asset.asset_id).await.unwrap().unwrap();
  assert_eq!(stored.available_quantity, 1);
}

// ─── Concurrency ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_approvals_never_oversubscribe() {
  const STOCK: u32 = 3;
  const REQUESTS: usize = 10;

  let e = engine().await;
  let asset = seed_asset(&e, "ThinkPad X1", STOCK).await;

  let mut request_ids = Vec::new();
  for i in 0..REQUESTS {
    let requester = member(&format!("emp{i}@ex.com"));
    let r = e
      .submit(&requester, SubmitInput { asset_id: asset.asset_id, note: None })
      .await
      .unwrap();
    request_ids.push(r.request_id);
  }

  let mut handles = Vec::new();
  for request_id in request_ids {
    let e = e.clone();
    handles.push(tokio::spawn(async move {
      e.approve(&admin(), request_id).await
    }));
  }

  let mut approved = 0;
  let mut out_of_stock = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => approved += 1,
      Err(Error::InsufficientStock(_)) => out_of_stock += 1,
      Err(other) => panic!("unexpected error: {other}"),
    }
  }

  assert_eq!(approved, STOCK as usize);
  assert_eq!(out_of_stock, REQUESTS - STOCK as usize);
  assert_eq!(available(&e, asset.asset_id).await, 0);
}

#[tokio::test]
async fn concurrent_approvals_of_one_request_decide_it_once() {
  let e = engine().await;
  let asset = seed_asset(&e, "ThinkPad X1", 5).await;
  let r = e
    .submit(&member("alice@ex.com"), SubmitInput { asset_id: asset.asset_id, note: None })
    .await
    .unwrap();

  let mut handles = Vec::new();
  for _ in 0..4 {
    let e = e.clone();
    let id = r.request_id;
    handles.push(tokio::spawn(async move { e.approve(&admin(), id).await }));
  }

  let mut ok = 0;
  for handle in handles {
    if handle.await.unwrap().is_ok() {
      ok += 1;
    }
  }

  assert_eq!(ok, 1, "exactly one concurrent approval must win");
  assert_eq!(available(&e, asset.asset_id).await, 4);
}

// ─── Lifecycle walkthroughs ──────────────────────────────────────────────────

#[tokio::test]
async fn single_unit_walkthrough() {
  // Asset{total=1}: approve A, B fails to submit, return restores stock.
  let e = engine().await;
  let asset = seed_asset(&e, "Projector", 1).await;
  let alice = member("alice@ex.com");

  let r1 = e.submit(&alice, SubmitInput { asset_id: asset.asset_id, note: None }).await.unwrap();
  e.approve(&admin(), r1.request_id).await.unwrap();
  assert_eq!(available(&e, asset.asset_id).await, 0);

  let assignments = e.my_assignments(&alice).await.unwrap();
  assert_eq!(assignments.len(), 1);
  assert_eq!(assignments[0].status, AssignmentStatus::Assigned);

  let affiliations = e.list_affiliations(&admin()).await.unwrap();
  assert_eq!(affiliations.len(), 1);
  assert_eq!(affiliations[0].status, AffiliationStatus::Active);

  let err = e
    .submit(&member("bob@ex.com"), SubmitInput { asset_id: asset.asset_id, note: None })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InsufficientStock(_)));

  e.return_assignment(&alice, assignments[0].assignment_id).await.unwrap();
  assert_eq!(available(&e, asset.asset_id).await, 1);
}

#[tokio::test]
async fn double_approve_decrements_once() {
  let e = engine().await;
  let asset = seed_asset(&e, "Monitor", 4).await;
  let r = e
    .submit(&member("alice@ex.com"), SubmitInput { asset_id: asset.asset_id, note: None })
    .await
    .unwrap();

  e.approve(&admin(), r.request_id).await.unwrap();
  let err = e.approve(&admin(), r.request_id).await.unwrap_err();
  assert!(matches!(err, Error::InvalidState { .. }));
  assert_eq!(available(&e, asset.asset_id).await, 3);
}

#[tokio::test]
async fn reject_then_approve_fails_invalid_state() {
  let e = engine().await;
  let asset = seed_asset(&e, "Monitor", 1).await;
  let r = e
    .submit(&member("alice@ex.com"), SubmitInput { asset_id: asset.asset_id, note: None })
    .await
    .unwrap();

  e.reject(&admin(), r.request_id).await.unwrap();
  let err = e.approve(&admin(), r.request_id).await.unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidState { status: RequestStatus::Rejected, .. }
  ));
  assert_eq!(available(&e, asset.asset_id).await, 1);
}

#[tokio::test]
async fn double_return_increments_once() {
  let e = engine().await;
  let asset = seed_asset(&e, "Keyboard", 1).await;
  let alice = member("alice@ex.com");

  let r = e.submit(&alice, SubmitInput { asset_id: asset.asset_id, note: None }).await.unwrap();
  e.approve(&admin(), r.request_id).await.unwrap();
  let assignment_id = e.my_assignments(&alice).await.unwrap()[0].assignment_id;

  e.return_assignment(&alice, assignment_id).await.unwrap();
  let err = e.return_assignment(&alice, assignment_id).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyReturned(_)));
  assert_eq!(available(&e, asset.asset_id).await, 1);
}

#[tokio::test]
async fn remove_employee_returns_everything_and_deactivates() {
  let e = engine().await;
  let laptop = seed_asset(&e, "ThinkPad X1", 2).await;
  let monitor = seed_asset(&e, "Monitor", 1).await;
  let alice = member("alice@ex.com");

  for asset_id in [laptop.asset_id, monitor.asset_id] {
    let r = e.submit(&alice, SubmitInput { asset_id, note: None }).await.unwrap();
    e.approve(&admin(), r.request_id).await.unwrap();
  }
  assert_eq!(available(&e, laptop.asset_id).await, 1);
  assert_eq!(available(&e, monitor.asset_id).await, 0);

  let summary = e.remove_employee(&admin(), "alice@ex.com").await.unwrap();
  assert_eq!(summary.returned, 2);
  assert!(summary.affiliation_deactivated);

  assert_eq!(available(&e, laptop.asset_id).await, 2);
  assert_eq!(available(&e, monitor.asset_id).await, 1);

  let affiliations = e.list_affiliations(&admin()).await.unwrap();
  assert_eq!(affiliations.len(), 1);
  assert_eq!(affiliations[0].status, AffiliationStatus::Inactive);
}

// ─── Affiliations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_affiliation_is_first_write_wins() {
  let s = store().await;
  let now = chrono::Utc::now();

  assert!(s.ensure_affiliation("a@ex.com".into(), "acme".into(), now).await.unwrap());
  assert!(!s.ensure_affiliation("a@ex.com".into(), "acme".into(), now).await.unwrap());

  // Deactivation does not allow a new insert for the same pair.
  assert!(s.deactivate_affiliation("a@ex.com".into(), "acme".into()).await.unwrap());
  assert!(!s.ensure_affiliation("a@ex.com".into(), "acme".into(), now).await.unwrap());

  let affiliations = s.list_affiliations("acme".into()).await.unwrap();
  assert_eq!(affiliations.len(), 1);
  assert_eq!(affiliations[0].status, AffiliationStatus::Inactive);
}

#[tokio::test]
async fn deactivate_missing_affiliation_reports_false() {
  let s = store().await;
  assert!(!s.deactivate_affiliation("ghost@ex.com".into(), "acme".into()).await.unwrap());
}

// ─── Asset CRUD and queries ──────────────────────────────────────────────────

#[tokio::test]
async fn update_shifts_available_by_total_delta() {
  let e = engine().await;
  let asset = seed_asset(&e, "Chair", 5).await;
  let alice = member("alice@ex.com");

  // Check out two units, then grow the pool.
  for _ in 0..2 {
    let r = e.submit(&alice, SubmitInput { asset_id: asset.asset_id, note: None }).await.unwrap();
    e.approve(&admin(), r.request_id).await.unwrap();
  }

  let grown = e
    .update_asset(
      &admin(),
      asset.asset_id,
      steward_core::asset::AssetPatch { total_quantity: Some(8), ..Default::default() },
    )
    .await
    .unwrap();
  assert_eq!(grown.total_quantity, 8);
  assert_eq!(grown.available_quantity, 6);

  // Shrinking below the checked-out count clamps at zero.
  let shrunk = e
    .update_asset(
      &admin(),
      asset.asset_id,
      steward_core::asset::AssetPatch { total_quantity: Some(1), ..Default::default() },
    )
    .await
    .unwrap();
  assert_eq!(shrunk.total_quantity, 1);
  assert_eq!(shrunk.available_quantity, 0);
}

#[tokio::test]
async fn list_assets_filters_compose() {
  let e = engine().await;
  seed_asset(&e, "ThinkPad X1", 2).await;
  seed_asset(&e, "ThinkPad X2", 0).await;
  let a = admin();
  e.create_asset(
    &a,
    NewAssetInput { name: "Monitor".into(), image: None, kind: "display".into(), total_quantity: 3 },
  )
  .await
  .unwrap();

  let laptops = e
    .list_assets(&a, AssetQuery { name: Some("thinkpad".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(laptops.len(), 2);

  let in_stock = e
    .list_assets(
      &a,
      AssetQuery { name: Some("thinkpad".into()), in_stock: true, ..Default::default() },
    )
    .await
    .unwrap();
  assert_eq!(in_stock.len(), 1);
  assert_eq!(in_stock[0].name, "ThinkPad X1");

  let displays = e
    .list_assets(&a, AssetQuery { kind: Some("display".into()), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(displays.len(), 1);
}

#[tokio::test]
async fn delete_asset_leaves_request_snapshots_intact() {
  let e = engine().await;
  let asset = seed_asset(&e, "Projector", 1).await;
  let alice = member("alice@ex.com");

  let r = e.submit(&alice, SubmitInput { asset_id: asset.asset_id, note: None }).await.unwrap();
  e.delete_asset(&admin(), asset.asset_id).await.unwrap();

  let mine = e.my_requests(&alice).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].request_id, r.request_id);
  assert_eq!(mine[0].asset.name, "Projector");

  // Approving now fails cleanly: the asset is gone.
  let err = e.approve(&admin(), r.request_id).await.unwrap_err();
  assert!(matches!(err, Error::AssetNotFound(_)));
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn top_requested_ranks_by_request_count() {
  let e = engine().await;
  let laptop = seed_asset(&e, "ThinkPad X1", 5).await;
  let monitor = seed_asset(&e, "Monitor", 5).await;
  let chair = seed_asset(&e, "Chair", 5).await;
  let alice = member("alice@ex.com");

  for _ in 0..3 {
    e.submit(&alice, SubmitInput { asset_id: monitor.asset_id, note: None }).await.unwrap();
  }
  e.submit(&alice, SubmitInput { asset_id: laptop.asset_id, note: None }).await.unwrap();

  let top = e.top_requested(&admin(), 2).await.unwrap();
  assert_eq!(top.len(), 2);
  assert_eq!(top[0].0.asset_id, monitor.asset_id);
  assert_eq!(top[0].1, 3);
  assert_eq!(top[1].0.asset_id, laptop.asset_id);
  assert_eq!(top[1].1, 1);

  // The un-requested asset appears only when the limit allows.
  let top3 = e.top_requested(&admin(), 5).await.unwrap();
  assert_eq!(top3.len(), 3);
  assert_eq!(top3[2].0.asset_id, chair.asset_id);
  assert_eq!(top3[2].1, 0);
}

// ─── Request listings ────────────────────────────────────────────────────────

#[tokio::test]
async fn listings_are_scoped_to_organization_and_requester() {
  let e = engine().await;
  let asset = seed_asset(&e, "ThinkPad X1", 5).await;
  let alice = member("alice@ex.com");
  let bob = member("bob@ex.com");

  e.submit(&alice, SubmitInput { asset_id: asset.asset_id, note: None }).await.unwrap();
  e.submit(&bob, SubmitInput { asset_id: asset.asset_id, note: None }).await.unwrap();

  let all = e.list_requests(&admin()).await.unwrap();
  assert_eq!(all.len(), 2);

  let mine = e.my_requests(&alice).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].requester, "alice@ex.com");

  // Members cannot pull the organization-wide listing.
  let err = e.list_requests(&alice).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));
}
