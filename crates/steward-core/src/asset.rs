//! Asset — a physical item tracked in an organization's inventory.
//!
//! Quantity accounting is the one hard invariant in this module:
//! `0 <= available_quantity <= total_quantity`, maintained by the store's
//! atomic reserve/release primitives and by admin updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable copy of the asset fields that requests and assignments carry
/// for historical display. Snapshots are taken at submission time and never
/// follow later edits to the source asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSnapshot {
  pub name: String,
  pub kind: String,
}

/// A physical asset owned by an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
  pub asset_id:           Uuid,
  pub name:               String,
  /// Optional image URL for display.
  pub image:              Option<String>,
  /// Free-form category, e.g. "laptop" or "monitor".
  pub kind:               String,
  pub total_quantity:     u32,
  pub available_quantity: u32,
  pub organization:       String,
  /// Identity of the admin who registered the asset. Only this admin may
  /// delete it.
  pub added_by:           String,
  pub created_at:         DateTime<Utc>,
}

impl Asset {
  pub fn snapshot(&self) -> AssetSnapshot {
    AssetSnapshot {
      name: self.name.clone(),
      kind: self.kind.clone(),
    }
  }
}

/// Input for creating an asset. The store assigns the id and timestamp and
/// starts `available_quantity` at `total_quantity`.
#[derive(Debug, Clone)]
pub struct NewAsset {
  pub name:           String,
  pub image:          Option<String>,
  pub kind:           String,
  pub total_quantity: u32,
  pub organization:   String,
  pub added_by:       String,
}

/// Partial update applied to an asset. `None` fields are left untouched.
///
/// Changing `total_quantity` shifts `available_quantity` by the same delta,
/// clamped to `[0, total_quantity]`, so outstanding assignments stay
/// accounted for.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetPatch {
  pub name:           Option<String>,
  pub image:          Option<String>,
  pub kind:           Option<String>,
  pub total_quantity: Option<u32>,
}

impl AssetPatch {
  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.image.is_none()
      && self.kind.is_none()
      && self.total_quantity.is_none()
  }
}
