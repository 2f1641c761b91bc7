//! The authorization gate.
//!
//! Resolves the caller's identity to a user record, checks the role, and
//! re-validates the property ownership chain on every call. An asset's
//! `property_id` is the only access-control anchor.

use uuid::Uuid;

use crate::{
  Error, Result,
  directory::{Property, User},
  error::Entity,
  store::AssetStore,
};

/// Identity as delivered by the authentication layer; `None` when the
/// request carried none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Identity(pub Option<Uuid>);

impl Identity {
  pub fn user(user_id: Uuid) -> Self { Self(Some(user_id)) }

  pub fn anonymous() -> Self { Self(None) }
}

/// Resolve `identity` to a user allowed to operate on assets.
pub async fn authenticate<S: AssetStore>(store: &S, identity: Identity) -> Result<User> {
  let user_id = identity.0.ok_or(Error::Unauthorized)?;
  let user = store
    .get_user(user_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound(Entity::User, user_id))?;
  if !user.role.may_manage_assets() {
    return Err(Error::Forbidden(user_id));
  }
  Ok(user)
}

/// Load `property_id` and check that `caller` manages it.
pub async fn authorize_property<S: AssetStore>(
  store: &S,
  caller: &User,
  property_id: Uuid,
) -> Result<Property> {
  let property = store
    .get_property(property_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::NotFound(Entity::Property, property_id))?;
  ensure_owner(caller, &property)?;
  Ok(property)
}

pub fn ensure_owner(caller: &User, property: &Property) -> Result<()> {
  if property.manager_id == caller.user_id {
    Ok(())
  } else {
    Err(Error::AccessDenied(property.property_id))
  }
}

/// Properties in scope for a read: the one requested (after an ownership
/// check) or every property the caller manages.
pub async fn scope<S: AssetStore>(
  store: &S,
  caller: &User,
  property_id: Option<Uuid>,
) -> Result<Vec<Uuid>> {
  match property_id {
    Some(id) => Ok(vec![authorize_property(store, caller, id).await?.property_id]),
    None => Ok(
      store
        .list_managed_properties(caller.user_id)
        .await
        .map_err(Error::store)?
        .into_iter()
        .map(|p| p.property_id)
        .collect(),
    ),
  }
}
