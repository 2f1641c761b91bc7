//! Users and properties: the directory records the authorization gate reads.
//!
//! These are owned by the surrounding back office; the engine only looks
//! them up.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
  Manager,
  FieldTechnician,
  Tenant,
}

impl Role {
  /// Roles allowed to operate on assets at all.
  pub fn may_manage_assets(self) -> bool {
    matches!(self, Self::Manager | Self::FieldTechnician)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:      Uuid,
  pub name:         String,
  pub email:        String,
  pub role:         Role,
  /// Properties this user has access to, independent of ownership.
  #[serde(default)]
  pub property_ids: Vec<Uuid>,
}

impl User {
  /// Whether assets of `property_id` may be handed to this user.
  pub fn can_receive_assets_of(&self, property_id: Uuid) -> bool {
    self.role == Role::Manager || self.property_ids.contains(&property_id)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
  pub property_id: Uuid,
  pub name:        String,
  /// The single manager who owns this property.
  pub manager_id:  Uuid,
}
