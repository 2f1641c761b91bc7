//! The asset lifecycle state machine.
//!
//! Every function here is pure over an in-memory [`Asset`]: it validates the
//! requested move against the transition table and the assignment
//! preconditions, then rewrites `status`, `assigned_to`, `assigned_at` and
//! `updated_at` together. Persisting the result and writing the matching
//! history entry is the caller's job.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  asset::{Asset, AssetCondition, AssetStatus},
};

// ─── Transition table ────────────────────────────────────────────────────────

/// Statuses reachable in one step from `from`.
pub fn allowed_targets(from: AssetStatus) -> &'static [AssetStatus] {
  use AssetStatus::*;
  match from {
    Available => &[CheckedOut, Maintenance, Retired, Lost],
    CheckedOut => &[Available, Maintenance, Retired, Lost],
    Maintenance => &[Available, CheckedOut, Retired, Lost],
    Retired => &[Available],
    Lost => &[Available],
  }
}

pub fn can_transition(from: AssetStatus, to: AssetStatus) -> bool {
  allowed_targets(from).contains(&to)
}

/// Fails with [`Error::InvalidTransition`] outside the table.
pub fn check_transition(from: AssetStatus, to: AssetStatus) -> Result<()> {
  if can_transition(from, to) {
    Ok(())
  } else {
    Err(Error::InvalidTransition { from, to })
  }
}

// ─── Assignment ──────────────────────────────────────────────────────────────

fn ensure_unassigned(asset: &Asset) -> Result<()> {
  match asset.assigned_to {
    Some(user_id) => Err(Error::AlreadyAssigned { asset_id: asset.asset_id, user_id }),
    None => Ok(()),
  }
}

fn clear_assignment(asset: &mut Asset) {
  asset.assigned_to = None;
  asset.assigned_at = None;
}

/// Hand an `available`, unassigned asset to `user_id`.
pub fn check_out(
  asset: &mut Asset,
  user_id: Uuid,
  location: Option<String>,
  now: DateTime<Utc>,
) -> Result<()> {
  ensure_unassigned(asset)?;
  if asset.status != AssetStatus::Available {
    return Err(Error::NotAvailable { asset_id: asset.asset_id, status: asset.status });
  }
  occupy(asset, user_id, location, now);
  Ok(())
}

/// Hand an unassigned asset to `user_id` from any status that may move to
/// `checked_out`.
pub fn assign(
  asset: &mut Asset,
  user_id: Uuid,
  location: Option<String>,
  now: DateTime<Utc>,
) -> Result<()> {
  ensure_unassigned(asset)?;
  check_transition(asset.status, AssetStatus::CheckedOut)?;
  occupy(asset, user_id, location, now);
  Ok(())
}

fn occupy(asset: &mut Asset, user_id: Uuid, location: Option<String>, now: DateTime<Utc>) {
  asset.status = AssetStatus::CheckedOut;
  asset.assigned_to = Some(user_id);
  asset.assigned_at = Some(now);
  if let Some(location) = location {
    asset.location = location;
  }
  asset.updated_at = now;
}

/// Take a checked-out asset back; returns the previous assignee.
///
/// Serves both check-in and unassign.
pub fn release(
  asset: &mut Asset,
  location: Option<String>,
  condition: Option<AssetCondition>,
  now: DateTime<Utc>,
) -> Result<Uuid> {
  let previous = match (asset.status, asset.assigned_to) {
    (AssetStatus::CheckedOut, Some(user_id)) => user_id,
    _ => return Err(Error::NotAssigned(asset.asset_id)),
  };
  asset.status = AssetStatus::Available;
  clear_assignment(asset);
  if let Some(location) = location {
    asset.location = location;
  }
  if let Some(condition) = condition {
    asset.condition = condition;
  }
  asset.updated_at = now;
  Ok(previous)
}

// ─── Status changes ──────────────────────────────────────────────────────────

/// Move an asset to `to` directly.
///
/// Entering any status other than `checked_out` clears the assignment, even
/// if none was recorded. `checked_out` itself cannot be entered this way
/// since it needs an assignee.
pub fn set_status(asset: &mut Asset, to: AssetStatus, now: DateTime<Utc>) -> Result<()> {
  check_transition(asset.status, to)?;
  if to == AssetStatus::CheckedOut {
    return Err(Error::NotAssigned(asset.asset_id));
  }
  asset.status = to;
  clear_assignment(asset);
  asset.updated_at = now;
  Ok(())
}

/// Bring a `retired` or `lost` asset back into service.
pub fn reactivate(asset: &mut Asset, now: DateTime<Utc>) -> Result<()> {
  match asset.status {
    AssetStatus::Retired | AssetStatus::Lost => {
      set_status(asset, AssetStatus::Available, now)
    }
    from => Err(Error::InvalidTransition { from, to: AssetStatus::Available }),
  }
}
