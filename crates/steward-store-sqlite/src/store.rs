//! [`SqliteStore`] — the SQLite implementation of [`AssetStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use steward_core::{
  affiliation::Affiliation,
  asset::{Asset, AssetPatch, NewAsset},
  assignment::{Assignment, NewAssignment},
  request::{Decision, NewRequest, Request},
  store::{AssetQuery, AssetStore, Reservation, StoreError},
};

use crate::{
  Result,
  encode::{
    RawAffiliation, RawAsset, RawAssignment, RawRequest, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Steward store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All writes
/// funnel through one connection thread, which is what makes the conditional
/// UPDATEs below behave as compare-and-swap primitives.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

fn db(e: tokio_rusqlite::Error) -> StoreError {
  StoreError::backend(e)
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row mappers ─────────────────────────────────────────────────────────────

const ASSET_COLS: &str = "asset_id, name, image, kind, total_quantity, \
                          available_quantity, organization, added_by, created_at";

fn asset_row(row: &rusqlite::Row) -> rusqlite::Result<RawAsset> {
  Ok(RawAsset {
    asset_id:           row.get(0)?,
    name:               row.get(1)?,
    image:              row.get(2)?,
    kind:               row.get(3)?,
    total_quantity:     row.get(4)?,
    available_quantity: row.get(5)?,
    organization:       row.get(6)?,
    added_by:           row.get(7)?,
    created_at:         row.get(8)?,
  })
}

const REQUEST_COLS: &str = "request_id, asset_id, asset_name, asset_kind, \
                            requester, organization, note, requested_at, \
                            decided_at, decided_by, status";

fn request_row(row: &rusqlite::Row) -> rusqlite::Result<RawRequest> {
  Ok(RawRequest {
    request_id:   row.get(0)?,
    asset_id:     row.get(1)?,
    asset_name:   row.get(2)?,
    asset_kind:   row.get(3)?,
    requester:    row.get(4)?,
    organization: row.get(5)?,
    note:         row.get(6)?,
    requested_at: row.get(7)?,
    decided_at:   row.get(8)?,
    decided_by:   row.get(9)?,
    status:       row.get(10)?,
  })
}

const ASSIGNMENT_COLS: &str = "assignment_id, asset_id, asset_name, asset_kind, \
                               employee, organization, assigned_at, returned_at, \
                               status";

fn assignment_row(row: &rusqlite::Row) -> rusqlite::Result<RawAssignment> {
  Ok(RawAssignment {
    assignment_id: row.get(0)?,
    asset_id:      row.get(1)?,
    asset_name:    row.get(2)?,
    asset_kind:    row.get(3)?,
    employee:      row.get(4)?,
    organization:  row.get(5)?,
    assigned_at:   row.get(6)?,
    returned_at:   row.get(7)?,
    status:        row.get(8)?,
  })
}

fn affiliation_row(row: &rusqlite::Row) -> rusqlite::Result<RawAffiliation> {
  Ok(RawAffiliation {
    affiliation_id: row.get(0)?,
    employee:       row.get(1)?,
    organization:   row.get(2)?,
    affiliated_at:  row.get(3)?,
    status:         row.get(4)?,
  })
}

// ─── AssetStore impl ─────────────────────────────────────────────────────────

impl AssetStore for SqliteStore {
  // ── Assets ────────────────────────────────────────────────────────────────

  async fn insert_asset(&self, input: NewAsset) -> Result<Asset, StoreError> {
    let asset = Asset {
      asset_id:           Uuid::new_v4(),
      name:               input.name,
      image:              input.image,
      kind:               input.kind,
      total_quantity:     input.total_quantity,
      available_quantity: input.total_quantity,
      organization:       input.organization,
      added_by:           input.added_by,
      created_at:         Utc::now(),
    };

    let id_str = encode_uuid(asset.asset_id);
    let at_str = encode_dt(asset.created_at);
    let a      = asset.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO assets (
             asset_id, name, image, kind, total_quantity,
             available_quantity, organization, added_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            a.name,
            a.image,
            a.kind,
            a.total_quantity as i64,
            a.available_quantity as i64,
            a.organization,
            a.added_by,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(db)?;

    Ok(asset)
  }

  async fn get_asset(&self, id: Uuid) -> Result<Option<Asset>, StoreError> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAsset> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ASSET_COLS} FROM assets WHERE asset_id = ?1"),
              rusqlite::params![id_str],
              asset_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(db)?;

    Ok(raw.map(RawAsset::into_asset).transpose()?)
  }

  async fn list_assets(&self, query: AssetQuery) -> Result<Vec<Asset>, StoreError> {
    let org_str      = query.organization.clone();
    let name_pattern = query.name.as_deref().map(|n| format!("%{n}%"));
    let kind_str     = query.kind.clone();
    let in_stock     = query.in_stock;
    let limit_val    = query.limit.unwrap_or(100) as i64;
    let offset_val   = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawAsset> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically; parameter slots are fixed.
        let mut conds: Vec<&'static str> = vec![];
        if org_str.is_some() {
          conds.push("organization = ?1");
        }
        if name_pattern.is_some() {
          conds.push("name LIKE ?2");
        }
        if kind_str.is_some() {
          conds.push("kind = ?3");
        }
        if in_stock {
          conds.push("available_quantity >= 1");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT {ASSET_COLS} FROM assets
           {where_clause}
           ORDER BY created_at DESC
           LIMIT ?4 OFFSET ?5"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              org_str.as_deref(),
              name_pattern.as_deref(),
              kind_str.as_deref(),
              limit_val,
              offset_val,
            ],
            asset_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db)?;

    Ok(
      raws
        .into_iter()
        .map(RawAsset::into_asset)
        .collect::<Result<_>>()?,
    )
  }

  async fn update_asset(&self, id: Uuid, patch: AssetPatch) -> Result<bool, StoreError> {
    let id_str    = encode_uuid(id);
    let new_total = patch.total_quantity.map(|t| t as i64);

    let changed = self
      .conn
      .call(move |conn| {
        // All right-hand expressions see the pre-update row, so
        // available_quantity is shifted by the total delta and clamped in
        // the same atomic statement.
        let n = conn.execute(
          "UPDATE assets SET
             name  = COALESCE(?1, name),
             image = COALESCE(?2, image),
             kind  = COALESCE(?3, kind),
             available_quantity = CASE
               WHEN ?4 IS NULL THEN available_quantity
               ELSE MAX(0, MIN(?4, available_quantity + (?4 - total_quantity)))
             END,
             total_quantity = COALESCE(?4, total_quantity)
           WHERE asset_id = ?5",
          rusqlite::params![patch.name, patch.image, patch.kind, new_total, id_str],
        )?;
        Ok(n)
      })
      .await
      .map_err(db)?;

    Ok(changed == 1)
  }

  async fn delete_asset(&self, id: Uuid) -> Result<bool, StoreError> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM assets WHERE asset_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await
      .map_err(db)?;

    Ok(changed == 1)
  }

  // ── Reservation ───────────────────────────────────────────────────────────

  async fn reserve(&self, asset_id: Uuid) -> Result<Reservation, StoreError> {
    let id_str = encode_uuid(asset_id);

    let outcome = self
      .conn
      .call(move |conn| {
        // Conditional decrement; the `available_quantity >= 1` guard makes
        // this the compare-and-swap that keeps the counter non-negative
        // under concurrent approvals.
        let n = conn.execute(
          "UPDATE assets
           SET available_quantity = available_quantity - 1
           WHERE asset_id = ?1 AND available_quantity >= 1",
          rusqlite::params![id_str],
        )?;
        if n == 1 {
          return Ok(Reservation::Reserved);
        }

        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM assets WHERE asset_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        Ok(if exists {
          Reservation::InsufficientStock
        } else {
          Reservation::NotFound
        })
      })
      .await
      .map_err(db)?;

    Ok(outcome)
  }

  async fn release(&self, asset_id: Uuid) -> Result<(), StoreError> {
    let id_str = encode_uuid(asset_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE assets
           SET available_quantity = MIN(available_quantity + 1, total_quantity)
           WHERE asset_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await
      .map_err(db)?;

    Ok(())
  }

  // ── Requests ──────────────────────────────────────────────────────────────

  async fn insert_request(&self, input: NewRequest) -> Result<Request, StoreError> {
    let request = Request {
      request_id:   Uuid::new_v4(),
      asset_id:     input.asset_id,
      asset:        input.asset,
      requester:    input.requester,
      organization: input.organization,
      note:         input.note,
      requested_at: Utc::now(),
      decided_at:   None,
      decided_by:   None,
      status:       steward_core::request::RequestStatus::Pending,
    };

    let id_str       = encode_uuid(request.request_id);
    let asset_id_str = encode_uuid(request.asset_id);
    let at_str       = encode_dt(request.requested_at);
    let r            = request.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO requests (
             request_id, asset_id, asset_name, asset_kind, requester,
             organization, note, requested_at, status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending')",
          rusqlite::params![
            id_str,
            asset_id_str,
            r.asset.name,
            r.asset.kind,
            r.requester,
            r.organization,
            r.note,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(db)?;

    Ok(request)
  }

  async fn get_request(&self, id: Uuid) -> Result<Option<Request>, StoreError> {
    let id_str = encode_uuid(id);

    let raw: Option<RawRequest> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {REQUEST_COLS} FROM requests WHERE request_id = ?1"),
              rusqlite::params![id_str],
              request_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(db)?;

    Ok(raw.map(RawRequest::into_request).transpose()?)
  }

  async fn list_requests(&self, organization: String) -> Result<Vec<Request>, StoreError> {
    let raws: Vec<RawRequest> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REQUEST_COLS} FROM requests
           WHERE organization = ?1
           ORDER BY requested_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![organization], request_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db)?;

    Ok(
      raws
        .into_iter()
        .map(RawRequest::into_request)
        .collect::<Result<_>>()?,
    )
  }

  async fn list_requests_for_employee(
    &self,
    employee: String,
  ) -> Result<Vec<Request>, StoreError> {
    let raws: Vec<RawRequest> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REQUEST_COLS} FROM requests
           WHERE requester = ?1
           ORDER BY requested_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![employee], request_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db)?;

    Ok(
      raws
        .into_iter()
        .map(RawRequest::into_request)
        .collect::<Result<_>>()?,
    )
  }

  async fn decide_request(
    &self,
    id: Uuid,
    decision: Decision,
    decided_by: String,
    at: DateTime<Utc>,
  ) -> Result<bool, StoreError> {
    let id_str     = encode_uuid(id);
    let status_str = decision.status().as_str();
    let at_str     = encode_dt(at);

    let changed = self
      .conn
      .call(move |conn| {
        // The status guard serialises concurrent decisions of one request:
        // exactly one caller sees a changed row.
        Ok(conn.execute(
          "UPDATE requests
           SET status = ?1, decided_by = ?2, decided_at = ?3
           WHERE request_id = ?4 AND status = 'pending'",
          rusqlite::params![status_str, decided_by, at_str, id_str],
        )?)
      })
      .await
      .map_err(db)?;

    Ok(changed == 1)
  }

  async fn reopen_request(&self, id: Uuid) -> Result<bool, StoreError> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE requests
           SET status = 'pending', decided_by = NULL, decided_at = NULL
           WHERE request_id = ?1 AND status = 'approved'",
          rusqlite::params![id_str],
        )?)
      })
      .await
      .map_err(db)?;

    Ok(changed == 1)
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  async fn insert_assignment(
    &self,
    input: NewAssignment,
  ) -> Result<Assignment, StoreError> {
    let assignment = Assignment {
      assignment_id: Uuid::new_v4(),
      asset_id:      input.asset_id,
      asset:         input.asset,
      employee:      input.employee,
      organization:  input.organization,
      assigned_at:   Utc::now(),
      returned_at:   None,
      status:        steward_core::assignment::AssignmentStatus::Assigned,
    };

    let id_str       = encode_uuid(assignment.assignment_id);
    let asset_id_str = encode_uuid(assignment.asset_id);
    let at_str       = encode_dt(assignment.assigned_at);
    let a            = assignment.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO assignments (
             assignment_id, asset_id, asset_name, asset_kind, employee,
             organization, assigned_at, status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'assigned')",
          rusqlite::params![
            id_str,
            asset_id_str,
            a.asset.name,
            a.asset.kind,
            a.employee,
            a.organization,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(db)?;

    Ok(assignment)
  }

  async fn get_assignment(&self, id: Uuid) -> Result<Option<Assignment>, StoreError> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAssignment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ASSIGNMENT_COLS} FROM assignments WHERE assignment_id = ?1"
              ),
              rusqlite::params![id_str],
              assignment_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(db)?;

    Ok(raw.map(RawAssignment::into_assignment).transpose()?)
  }

  async fn list_assignments_for_employee(
    &self,
    employee: String,
  ) -> Result<Vec<Assignment>, StoreError> {
    let raws: Vec<RawAssignment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ASSIGNMENT_COLS} FROM assignments
           WHERE employee = ?1
           ORDER BY assigned_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![employee], assignment_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db)?;

    Ok(
      raws
        .into_iter()
        .map(RawAssignment::into_assignment)
        .collect::<Result<_>>()?,
    )
  }

  async fn list_active_assignments(
    &self,
    employee: String,
    organization: String,
  ) -> Result<Vec<Assignment>, StoreError> {
    let raws: Vec<RawAssignment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ASSIGNMENT_COLS} FROM assignments
           WHERE employee = ?1 AND organization = ?2 AND status = 'assigned'
           ORDER BY assigned_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![employee, organization], assignment_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db)?;

    Ok(
      raws
        .into_iter()
        .map(RawAssignment::into_assignment)
        .collect::<Result<_>>()?,
    )
  }

  async fn mark_returned(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(at);

    let changed = self
      .conn
      .call(move |conn| {
        // Idempotence guard: a second return matches zero rows.
        Ok(conn.execute(
          "UPDATE assignments
           SET status = 'returned', returned_at = ?1
           WHERE assignment_id = ?2 AND status = 'assigned'",
          rusqlite::params![at_str, id_str],
        )?)
      })
      .await
      .map_err(db)?;

    Ok(changed == 1)
  }

  async fn delete_assignment(&self, id: Uuid) -> Result<bool, StoreError> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM assignments WHERE assignment_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await
      .map_err(db)?;

    Ok(changed == 1)
  }

  // ── Affiliations ──────────────────────────────────────────────────────────

  async fn ensure_affiliation(
    &self,
    employee: String,
    organization: String,
    at: DateTime<Utc>,
  ) -> Result<bool, StoreError> {
    let id_str = encode_uuid(Uuid::new_v4());
    let at_str = encode_dt(at);

    let changed = self
      .conn
      .call(move |conn| {
        // First-write-wins: the UNIQUE (employee, organization) constraint
        // plus DO NOTHING makes this a no-op for any existing record,
        // active or inactive.
        Ok(conn.execute(
          "INSERT INTO affiliations (
             affiliation_id, employee, organization, affiliated_at, status
           ) VALUES (?1, ?2, ?3, ?4, 'active')
           ON CONFLICT (employee, organization) DO NOTHING",
          rusqlite::params![id_str, employee, organization, at_str],
        )?)
      })
      .await
      .map_err(db)?;

    Ok(changed == 1)
  }

  async fn deactivate_affiliation(
    &self,
    employee: String,
    organization: String,
  ) -> Result<bool, StoreError> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE affiliations
           SET status = 'inactive'
           WHERE employee = ?1 AND organization = ?2 AND status = 'active'",
          rusqlite::params![employee, organization],
        )?)
      })
      .await
      .map_err(db)?;

    Ok(changed == 1)
  }

  async fn list_affiliations(
    &self,
    organization: String,
  ) -> Result<Vec<Affiliation>, StoreError> {
    let raws: Vec<RawAffiliation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT affiliation_id, employee, organization, affiliated_at, status
           FROM affiliations
           WHERE organization = ?1
           ORDER BY affiliated_at DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![organization], affiliation_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db)?;

    Ok(
      raws
        .into_iter()
        .map(RawAffiliation::into_affiliation)
        .collect::<Result<_>>()?,
    )
  }

  // ── Stats ─────────────────────────────────────────────────────────────────

  async fn top_requested_assets(
    &self,
    organization: String,
    limit: usize,
  ) -> Result<Vec<(Asset, u64)>, StoreError> {
    let limit_val = limit as i64;

    let raws: Vec<(RawAsset, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.asset_id, a.name, a.image, a.kind, a.total_quantity,
                  a.available_quantity, a.organization, a.added_by, a.created_at,
                  COUNT(r.request_id) AS request_count
           FROM assets a
           LEFT JOIN requests r ON r.asset_id = a.asset_id
           WHERE a.organization = ?1
           GROUP BY a.asset_id
           ORDER BY request_count DESC, a.asset_id
           LIMIT ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![organization, limit_val], |row| {
            Ok((asset_row(row)?, row.get(9)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db)?;

    let mut ranked = Vec::with_capacity(raws.len());
    for (raw, n) in raws {
      ranked.push((raw.into_asset()?, n as u64));
    }
    Ok(ranked)
  }
}
