//! Caller identity as resolved by the access gate.
//!
//! Token verification itself is an external concern; by the time a `Caller`
//! exists, the credential has already been accepted. Identities are opaque
//! strings (in practice, email addresses) and organizations are opaque names.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The role a caller holds within their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// Elevated role, scoped to exactly one organization. Manages assets,
  /// requests, and employees within it.
  Admin,
  /// Requests and holds assets; becomes affiliated with an organization on
  /// first approved request.
  Member,
}

/// An authenticated caller, as resolved from a bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caller {
  pub identity:     String,
  pub organization: String,
  pub role:         Role,
}

impl Caller {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }

  /// Fail with [`Error::Forbidden`] unless the caller is an admin.
  pub fn require_admin(&self) -> Result<(), Error> {
    if self.is_admin() {
      Ok(())
    } else {
      Err(Error::Forbidden("admin role required".into()))
    }
  }
}
