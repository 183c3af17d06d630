//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Status enums are stored as
//! their lowercase names. UUIDs are stored as hyphenated lowercase strings.
//! Quantities are stored as INTEGER and read back as `i64`.

use chrono::{DateTime, Utc};
use steward_core::{
  affiliation::{Affiliation, AffiliationStatus},
  asset::{Asset, AssetSnapshot},
  assignment::{Assignment, AssignmentStatus},
  request::{Request, RequestStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Statuses ────────────────────────────────────────────────────────────────

pub fn decode_request_status(s: &str) -> Result<RequestStatus> {
  match s {
    "pending"  => Ok(RequestStatus::Pending),
    "approved" => Ok(RequestStatus::Approved),
    "rejected" => Ok(RequestStatus::Rejected),
    other => Err(Error::UnknownStatus(other.to_owned())),
  }
}

pub fn decode_assignment_status(s: &str) -> Result<AssignmentStatus> {
  match s {
    "assigned" => Ok(AssignmentStatus::Assigned),
    "returned" => Ok(AssignmentStatus::Returned),
    other => Err(Error::UnknownStatus(other.to_owned())),
  }
}

pub fn decode_affiliation_status(s: &str) -> Result<AffiliationStatus> {
  match s {
    "active"   => Ok(AffiliationStatus::Active),
    "inactive" => Ok(AffiliationStatus::Inactive),
    other => Err(Error::UnknownStatus(other.to_owned())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `assets` row.
pub struct RawAsset {
  pub asset_id:           String,
  pub name:               String,
  pub image:              Option<String>,
  pub kind:               String,
  pub total_quantity:     i64,
  pub available_quantity: i64,
  pub organization:       String,
  pub added_by:           String,
  pub created_at:         String,
}

impl RawAsset {
  pub fn into_asset(self) -> Result<Asset> {
    Ok(Asset {
      asset_id:           decode_uuid(&self.asset_id)?,
      name:               self.name,
      image:              self.image,
      kind:               self.kind,
      total_quantity:     self.total_quantity as u32,
      available_quantity: self.available_quantity as u32,
      organization:       self.organization,
      added_by:           self.added_by,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `requests` row.
pub struct RawRequest {
  pub request_id:   String,
  pub asset_id:     String,
  pub asset_name:   String,
  pub asset_kind:   String,
  pub requester:    String,
  pub organization: String,
  pub note:         Option<String>,
  pub requested_at: String,
  pub decided_at:   Option<String>,
  pub decided_by:   Option<String>,
  pub status:       String,
}

impl RawRequest {
  pub fn into_request(self) -> Result<Request> {
    Ok(Request {
      request_id:   decode_uuid(&self.request_id)?,
      asset_id:     decode_uuid(&self.asset_id)?,
      asset:        AssetSnapshot { name: self.asset_name, kind: self.asset_kind },
      requester:    self.requester,
      organization: self.organization,
      note:         self.note,
      requested_at: decode_dt(&self.requested_at)?,
      decided_at:   self.decided_at.as_deref().map(decode_dt).transpose()?,
      decided_by:   self.decided_by,
      status:       decode_request_status(&self.status)?,
    })
  }
}

/// Raw values read directly from an `assignments` row.
pub struct RawAssignment {
  pub assignment_id: String,
  pub asset_id:      String,
  pub asset_name:    String,
  pub asset_kind:    String,
  pub employee:      String,
  pub organization:  String,
  pub assigned_at:   String,
  pub returned_at:   Option<String>,
  pub status:        String,
}

impl RawAssignment {
  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      assignment_id: decode_uuid(&self.assignment_id)?,
      asset_id:      decode_uuid(&self.asset_id)?,
      asset:         AssetSnapshot { name: self.asset_name, kind: self.asset_kind },
      employee:      self.employee,
      organization:  self.organization,
      assigned_at:   decode_dt(&self.assigned_at)?,
      returned_at:   self.returned_at.as_deref().map(decode_dt).transpose()?,
      status:        decode_assignment_status(&self.status)?,
    })
  }
}

/// Raw values read directly from an `affiliations` row.
pub struct RawAffiliation {
  pub affiliation_id: String,
  pub employee:       String,
  pub organization:   String,
  pub affiliated_at:  String,
  pub status:         String,
}

impl RawAffiliation {
  pub fn into_affiliation(self) -> Result<Affiliation> {
    Ok(Affiliation {
      affiliation_id: decode_uuid(&self.affiliation_id)?,
      employee:       self.employee,
      organization:   self.organization,
      affiliated_at:  decode_dt(&self.affiliated_at)?,
      status:         decode_affiliation_status(&self.status)?,
    })
  }
}
