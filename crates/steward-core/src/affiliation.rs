//! Affiliation — the employee <-> organization relationship record.
//!
//! Created at most once per (employee, organization) pair, on the first
//! approved request. Never deleted; removal of an employee sets the record
//! inactive, preserving history. An inactive record is never resurrected by
//! a later approval (first-write-wins).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffiliationStatus {
  Active,
  Inactive,
}

impl AffiliationStatus {
  pub fn is_active(&self) -> bool { matches!(self, Self::Active) }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Active   => "active",
      Self::Inactive => "inactive",
    }
  }
}

impl fmt::Display for AffiliationStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affiliation {
  pub affiliation_id: Uuid,
  pub employee:       String,
  pub organization:   String,
  pub affiliated_at:  DateTime<Utc>,
  pub status:         AffiliationStatus,
}
