//! Request — an employee's petition for an asset.
//!
//! A request moves `pending -> {approved, rejected}` exactly once; both
//! outcomes are terminal. Approval is the only place inventory, assignments,
//! and affiliations are mutated together.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::asset::AssetSnapshot;

/// Lifecycle status of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
  Pending,
  Approved,
  Rejected,
}

impl RequestStatus {
  pub fn is_pending(&self) -> bool { matches!(self, Self::Pending) }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending  => "pending",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
    }
  }
}

impl fmt::Display for RequestStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The terminal outcome an admin applies to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Approved,
  Rejected,
}

impl Decision {
  pub fn status(&self) -> RequestStatus {
    match self {
      Self::Approved => RequestStatus::Approved,
      Self::Rejected => RequestStatus::Rejected,
    }
  }
}

/// An asset request. Carries an [`AssetSnapshot`] so the request remains
/// displayable even if the asset is later renamed or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
  pub request_id:   Uuid,
  pub asset_id:     Uuid,
  pub asset:        AssetSnapshot,
  pub requester:    String,
  pub organization: String,
  pub note:         Option<String>,
  pub requested_at: DateTime<Utc>,
  /// Set when the request leaves `Pending`.
  pub decided_at:   Option<DateTime<Utc>>,
  /// Identity of the admin who approved or rejected.
  pub decided_by:   Option<String>,
  pub status:       RequestStatus,
}

/// Input for inserting a pending request. The store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewRequest {
  pub asset_id:     Uuid,
  pub asset:        AssetSnapshot,
  pub requester:    String,
  pub organization: String,
  pub note:         Option<String>,
}
