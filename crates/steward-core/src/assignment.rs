//! Assignment — a checked-out asset held by an employee.
//!
//! Spawned 1:1 from an approved request; transitions `assigned -> returned`
//! exactly once, either by the employee or by an admin removing the employee.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::AssetSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
  Assigned,
  Returned,
}

impl AssignmentStatus {
  pub fn is_assigned(&self) -> bool { matches!(self, Self::Assigned) }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Assigned => "assigned",
      Self::Returned => "returned",
    }
  }
}

impl fmt::Display for AssignmentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A checked-out asset. Carries the same [`AssetSnapshot`] as its originating
/// request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id: Uuid,
  pub asset_id:      Uuid,
  pub asset:         AssetSnapshot,
  pub employee:      String,
  pub organization:  String,
  pub assigned_at:   DateTime<Utc>,
  pub returned_at:   Option<DateTime<Utc>>,
  pub status:        AssignmentStatus,
}

/// Input for inserting an assignment in `Assigned` state.
#[derive(Debug, Clone)]
pub struct NewAssignment {
  pub asset_id:     Uuid,
  pub asset:        AssetSnapshot,
  pub employee:     String,
  pub organization: String,
}
