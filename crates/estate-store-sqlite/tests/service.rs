//! End-to-end tests of `AssetService` over an in-memory `SqliteStore`.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use estate_core::{
  AssetService, Error,
  asset::{
    AssetCategory, AssetCondition, AssetStatus, AssetUpdate, BulkUpdate, CheckIn, CheckOut,
    CompleteMaintenance, MaintenanceScheduleInput, NewAsset, SkipReason, SkippedAsset,
  },
  auth::Identity,
  clock::ManualClock,
  dashboard::{AlertKind, AlertSeverity},
  directory::{Property, Role, User},
  error::{DateField, Entity},
  history::{HistoryAction, HistoryFilter},
  service::AssetFilter,
  store::AssetStore,
};
use estate_store_sqlite::SqliteStore;
use uuid::Uuid;

// ─── Fixture ─────────────────────────────────────────────────────────────────

struct Fixture {
  service:        AssetService<SqliteStore>,
  clock:          Arc<ManualClock>,
  manager:        Identity,
  manager_id:     Uuid,
  property:       Uuid,
  other_manager:  Identity,
  other_property: Uuid,
  technician:     Uuid,
  tenant:         Uuid,
}

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 6, 10, 14, 30, 0).unwrap() }

fn user(role: Role, property_ids: Vec<Uuid>) -> User {
  let user_id = Uuid::new_v4();
  User {
    user_id,
    name: format!("{role} {user_id}"),
    email: format!("{user_id}@example.com"),
    role,
    property_ids,
  }
}

async fn fixture() -> Fixture {
  let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
  let clock = Arc::new(ManualClock::new(t0()));

  let property = Uuid::new_v4();
  let other_property = Uuid::new_v4();
  let manager = user(Role::Manager, vec![property]);
  let other_manager = user(Role::Manager, vec![other_property]);
  let technician = user(Role::FieldTechnician, vec![property]);
  let tenant = user(Role::Tenant, vec![]);

  for u in [&manager, &other_manager, &technician, &tenant] {
    store.put_user(u.clone()).await.unwrap();
  }
  store
    .put_property(Property {
      property_id: property,
      name:        "Harbour View".into(),
      manager_id:  manager.user_id,
    })
    .await
    .unwrap();
  store
    .put_property(Property {
      property_id: other_property,
      name:        "Mill Lane".into(),
      manager_id:  other_manager.user_id,
    })
    .await
    .unwrap();

  Fixture {
    service: AssetService::with_clock(store, clock.clone()),
    clock,
    manager: Identity::user(manager.user_id),
    manager_id: manager.user_id,
    property,
    other_manager: Identity::user(other_manager.user_id),
    other_property,
    technician: technician.user_id,
    tenant: tenant.user_id,
  }
}

impl Fixture {
  async fn create(&self, tag: &str) -> Uuid {
    self.create_in(self.manager, self.property, tag).await
  }

  async fn create_in(&self, who: Identity, property_id: Uuid, tag: &str) -> Uuid {
    let input =
      NewAsset::new(property_id, tag, format!("Item {tag}"), AssetCategory::Tool, "Store room");
    self.service.create_asset(who, input).await.unwrap().asset_id
  }

  async fn actions(&self, asset_id: Uuid) -> Vec<HistoryAction> {
    self
      .service
      .list_asset_history(self.manager, asset_id, HistoryFilter::default(), None, Some(100))
      .await
      .unwrap()
      .page
      .into_iter()
      .map(|e| e.action)
      .collect()
  }

  /// Move the clock so consecutive entries get distinct timestamps.
  fn tick(&self) { self.clock.advance(Duration::seconds(1)); }

  fn check_out_to(&self, user_id: Uuid) -> CheckOut {
    CheckOut { user_id, expected_return_date: None, location: None, notes: None }
  }
}

// ─── Creation and authorization ──────────────────────────────────────────────

#[tokio::test]
async fn create_asset_records_created_entry() {
  let f = fixture().await;
  let id = f.create("DR-100").await;

  let view = f.service.get_asset(f.manager, id).await.unwrap();
  assert_eq!(view.asset.asset_tag, "DR-100");
  assert_eq!(view.asset.status, AssetStatus::Available);
  assert_eq!(view.asset.created_at, t0());
  assert_eq!(f.actions(id).await, vec![HistoryAction::Created]);
}

#[tokio::test]
async fn duplicate_tag_is_rejected() {
  let f = fixture().await;
  f.create("DR-100").await;
  let input = NewAsset::new(f.property, " DR-100 ", "Second drill", AssetCategory::Tool, "Shed");
  let err = f.service.create_asset(f.manager, input).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateTag(tag) if tag == "DR-100"));
}

#[tokio::test]
async fn create_rejects_invalid_input() {
  let f = fixture().await;

  let mut input = NewAsset::new(f.property, "X-1", "Ladder", AssetCategory::Equipment, "Shed");
  input.warranty_expiry = Some(t0() - Duration::days(1));
  let err = f.service.create_asset(f.manager, input).await.unwrap_err();
  assert!(matches!(err, Error::InvalidDate { field: DateField::WarrantyExpiry, .. }));

  let mut input = NewAsset::new(f.property, "X-2", "Ladder", AssetCategory::Equipment, "Shed");
  input.maintenance_schedule = Some(MaintenanceScheduleInput {
    interval_days:    0,
    last_maintenance: None,
    next_maintenance: None,
  });
  let err = f.service.create_asset(f.manager, input).await.unwrap_err();
  assert!(matches!(err, Error::InvalidInterval(0)));

  let mut input = NewAsset::new(f.property, "X-3", "Ladder", AssetCategory::Equipment, "Shed");
  input.status = AssetStatus::CheckedOut;
  let err = f.service.create_asset(f.manager, input).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));

  let input = NewAsset::new(f.property, "   ", "Ladder", AssetCategory::Equipment, "Shed");
  let err = f.service.create_asset(f.manager, input).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn callers_are_authenticated_and_role_checked() {
  let f = fixture().await;
  let input = || NewAsset::new(f.property, "A-1", "Mop", AssetCategory::Material, "Closet");

  let err = f.service.create_asset(Identity::anonymous(), input()).await.unwrap_err();
  assert!(matches!(err, Error::Unauthorized));

  let err = f.service.create_asset(Identity::user(f.tenant), input()).await.unwrap_err();
  assert!(matches!(err, Error::Forbidden(id) if id == f.tenant));

  let ghost = Uuid::new_v4();
  let err = f.service.create_asset(Identity::user(ghost), input()).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::User, id) if id == ghost));
}

#[tokio::test]
async fn property_ownership_is_enforced() {
  let f = fixture().await;
  let id = f.create("DR-100").await;

  let err = f.service.get_asset(f.other_manager, id).await.unwrap_err();
  assert!(matches!(err, Error::AccessDenied(p) if p == f.property));

  // Technicians linked to the property still do not own it.
  let err = f.service.get_asset(Identity::user(f.technician), id).await.unwrap_err();
  assert!(matches!(err, Error::AccessDenied(_)));

  let input = NewAsset::new(f.other_property, "FOREIGN", "Hose", AssetCategory::Tool, "Yard");
  let err = f.service.create_asset(f.manager, input).await.unwrap_err();
  assert!(matches!(err, Error::AccessDenied(p) if p == f.other_property));

  let missing = Uuid::new_v4();
  let input = NewAsset::new(missing, "NOWHERE", "Hose", AssetCategory::Tool, "Yard");
  let err = f.service.create_asset(f.manager, input).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::Property, p) if p == missing));

  let err = f.service.get_asset(f.manager, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::Asset, _)));
}

// ─── Listing and editing ─────────────────────────────────────────────────────

#[tokio::test]
async fn list_assets_is_scoped_to_managed_properties() {
  let f = fixture().await;
  f.create("MINE-1").await;
  f.create("MINE-2").await;
  f.create_in(f.other_manager, f.other_property, "THEIRS-1").await;

  let mine = f.service.list_assets(f.manager, AssetFilter::default()).await.unwrap();
  assert_eq!(mine.len(), 2);
  assert!(mine.iter().all(|v| v.asset.property_id == f.property));

  let filter = AssetFilter { search: Some("mine-2".into()), ..AssetFilter::default() };
  let found = f.service.list_assets(f.manager, filter).await.unwrap();
  assert_eq!(found.len(), 1);

  let filter = AssetFilter { property_id: Some(f.other_property), ..AssetFilter::default() };
  let err = f.service.list_assets(f.manager, filter).await.unwrap_err();
  assert!(matches!(err, Error::AccessDenied(_)));
}

#[tokio::test]
async fn update_asset_records_location_move() {
  let f = fixture().await;
  let id = f.create("DR-100").await;
  f.tick();

  let update = AssetUpdate {
    location: Some("Workshop".into()),
    current_value: Some(90.0),
    ..AssetUpdate::default()
  };
  let asset = f.service.update_asset(f.manager, id, update, None).await.unwrap();
  assert_eq!(asset.location, "Workshop");
  assert_eq!(asset.current_value, Some(90.0));

  let page = f
    .service
    .list_asset_history(f.manager, id, HistoryFilter::default(), None, None)
    .await
    .unwrap();
  let latest = &page.page[0];
  assert_eq!(latest.action, HistoryAction::Updated);
  assert_eq!(latest.from_location.as_deref(), Some("Store room"));
  assert_eq!(latest.to_location.as_deref(), Some("Workshop"));

  let err = f
    .service
    .update_asset(f.manager, id, AssetUpdate::default(), None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

// ─── Check-out / check-in ────────────────────────────────────────────────────

#[tokio::test]
async fn check_out_writes_exactly_one_check_out_entry() {
  let f = fixture().await;
  let id = f.create("DR-100").await;
  f.clock.advance(Duration::hours(1));

  let mut input = f.check_out_to(f.technician);
  input.location = Some("Unit 4B".into());
  let asset = f.service.check_out_asset(f.manager, id, input).await.unwrap();
  assert_eq!(asset.status, AssetStatus::CheckedOut);
  assert_eq!(asset.assigned_to, Some(f.technician));
  assert_eq!(asset.assigned_at, Some(t0() + Duration::hours(1)));

  let page = f
    .service
    .list_asset_history(f.manager, id, HistoryFilter::default(), None, None)
    .await
    .unwrap();
  let check_outs: Vec<_> =
    page.page.iter().filter(|e| e.action == HistoryAction::CheckOut).collect();
  assert_eq!(check_outs.len(), 1);
  let entry = check_outs[0];
  assert_eq!(entry.to_user, Some(f.technician));
  assert_eq!(entry.performed_by, f.manager_id);
  assert_eq!(entry.from_location.as_deref(), Some("Store room"));
  assert_eq!(entry.to_location.as_deref(), Some("Unit 4B"));
}

#[tokio::test]
async fn check_in_clears_assignment_and_records_previous_holder() {
  let f = fixture().await;
  let id = f.create("DR-100").await;
  f.service.check_out_asset(f.manager, id, f.check_out_to(f.technician)).await.unwrap();

  let input = CheckIn {
    location:  Some("Shed".into()),
    condition: Some(AssetCondition::Fair),
    notes:     Some("blade dull".into()),
  };
  let asset = f.service.check_in_asset(f.manager, id, input).await.unwrap();
  assert_eq!(asset.status, AssetStatus::Available);
  assert_eq!(asset.assigned_to, None);
  assert_eq!(asset.assigned_at, None);
  assert_eq!(asset.condition, AssetCondition::Fair);

  let page = f
    .service
    .list_asset_history(f.manager, id, HistoryFilter::default(), None, None)
    .await
    .unwrap();
  let entry = page.page.iter().find(|e| e.action == HistoryAction::CheckIn).unwrap();
  assert_eq!(entry.from_user, Some(f.technician));
  assert_eq!(entry.notes.as_deref(), Some("blade dull"));
}

#[tokio::test]
async fn double_check_out_is_already_assigned() {
  let f = fixture().await;
  let id = f.create("DR-100").await;
  f.tick();
  f.service.check_out_asset(f.manager, id, f.check_out_to(f.technician)).await.unwrap();

  let err = f
    .service
    .check_out_asset(f.manager, id, f.check_out_to(f.manager_id))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AlreadyAssigned { user_id, .. } if user_id == f.technician));
  assert_eq!(f.actions(id).await, vec![HistoryAction::CheckOut, HistoryAction::Created]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_check_outs_admit_one_holder() {
  let f = fixture().await;
  for n in 0..10 {
    let id = f.create(&format!("DR-{n}")).await;
    f.tick();

    let (to_tech, to_manager) = tokio::join!(
      f.service.check_out_asset(f.manager, id, f.check_out_to(f.technician)),
      f.service.check_out_asset(f.manager, id, f.check_out_to(f.manager_id)),
    );
    let holder = match (to_tech, to_manager) {
      (Ok(asset), Err(err)) | (Err(err), Ok(asset)) => {
        assert!(
          matches!(
            err,
            Error::Conflict(_) | Error::AlreadyAssigned { .. } | Error::NotAvailable { .. }
          ),
          "unexpected error: {err}"
        );
        asset.assigned_to
      }
      (Ok(_), Ok(_)) => panic!("both check-outs of {id} succeeded"),
      (Err(a), Err(b)) => panic!("both check-outs of {id} failed: {a}; {b}"),
    };

    let stored = f.service.get_asset(f.manager, id).await.unwrap().asset;
    assert_eq!(stored.assigned_to, holder);
    let check_outs =
      f.actions(id).await.into_iter().filter(|a| *a == HistoryAction::CheckOut).count();
    assert_eq!(check_outs, 1);
  }
}

#[tokio::test]
async fn check_out_preconditions() {
  let f = fixture().await;
  let id = f.create("DR-100").await;

  let mut input = f.check_out_to(f.technician);
  input.expected_return_date = Some(t0());
  let err = f.service.check_out_asset(f.manager, id, input).await.unwrap_err();
  assert!(matches!(err, Error::InvalidDate { field: DateField::ExpectedReturnDate, .. }));

  let err = f
    .service
    .check_out_asset(f.manager, id, f.check_out_to(f.tenant))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AccessDenied(_)));

  let nobody = Uuid::new_v4();
  let err = f.service.check_out_asset(f.manager, id, f.check_out_to(nobody)).await.unwrap_err();
  assert!(matches!(err, Error::NotFound(Entity::User, u) if u == nobody));

  f.service
    .update_asset_status(f.manager, id, AssetStatus::Maintenance, None)
    .await
    .unwrap();
  let err = f
    .service
    .check_out_asset(f.manager, id, f.check_out_to(f.technician))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotAvailable { status: AssetStatus::Maintenance, .. }));
}

#[tokio::test]
async fn check_in_requires_an_assignment() {
  let f = fixture().await;
  let id = f.create("DR-100").await;
  let err = f.service.check_in_asset(f.manager, id, CheckIn::default()).await.unwrap_err();
  assert!(matches!(err, Error::NotAssigned(a) if a == id));
}

#[tokio::test]
async fn assign_works_from_maintenance_and_unassign_releases() {
  let f = fixture().await;
  let id = f.create("DR-100").await;
  f.tick();
  f.service
    .update_asset_status(f.manager, id, AssetStatus::Maintenance, None)
    .await
    .unwrap();
  f.tick();

  let asset = f
    .service
    .assign_asset(f.manager, id, f.technician, Some("Roof".into()), None)
    .await
    .unwrap();
  assert_eq!(asset.status, AssetStatus::CheckedOut);
  assert_eq!(asset.location, "Roof");
  f.tick();

  let asset = f.service.unassign_asset(f.manager, id, None, None).await.unwrap();
  assert_eq!(asset.status, AssetStatus::Available);
  assert!(asset.assignment_consistent());

  assert_eq!(f.actions(id).await, vec![
    HistoryAction::Unassigned,
    HistoryAction::Assigned,
    HistoryAction::Status(AssetStatus::Maintenance),
    HistoryAction::Created,
  ]);
}

// ─── Status changes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn status_changes_follow_the_table() {
  let f = fixture().await;
  let id = f.create("DR-100").await;

  let err = f
    .service
    .update_asset_status(f.manager, id, AssetStatus::CheckedOut, None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotAssigned(_)));

  f.tick();
  f.service.check_out_asset(f.manager, id, f.check_out_to(f.technician)).await.unwrap();
  f.tick();
  let asset = f
    .service
    .update_asset_status(f.manager, id, AssetStatus::Lost, Some("left on site".into()))
    .await
    .unwrap();
  assert_eq!(asset.status, AssetStatus::Lost);
  assert_eq!(asset.assigned_to, None);

  let err = f
    .service
    .update_asset_status(f.manager, id, AssetStatus::Maintenance, None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidTransition {
    from: AssetStatus::Lost,
    to:   AssetStatus::Maintenance,
  }));

  f.tick();
  let asset = f.service.reactivate_asset(f.manager, id, None).await.unwrap();
  assert_eq!(asset.status, AssetStatus::Available);

  let err = f.service.reactivate_asset(f.manager, id, None).await.unwrap_err();
  assert!(matches!(err, Error::InvalidTransition { from: AssetStatus::Available, .. }));

  f.tick();
  f.service.retire_asset(f.manager, id, None).await.unwrap();
  let err = f
    .service
    .check_out_asset(f.manager, id, f.check_out_to(f.technician))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NotAvailable { status: AssetStatus::Retired, .. }));

  let lost_entry = f
    .service
    .list_asset_history(
      f.manager,
      id,
      HistoryFilter {
        action: Some(HistoryAction::Status(AssetStatus::Lost)),
        ..HistoryFilter::default()
      },
      None,
      None,
    )
    .await
    .unwrap();
  assert_eq!(lost_entry.page.len(), 1);
  assert_eq!(lost_entry.page[0].from_user, Some(f.technician));

  assert_eq!(f.actions(id).await[0], HistoryAction::Retired);
}

// ─── Maintenance ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn schedule_and_complete_maintenance() {
  let f = fixture().await;
  let id = f.create("HV-1").await;

  let input = MaintenanceScheduleInput {
    interval_days:    30,
    last_maintenance: None,
    next_maintenance: None,
  };
  let asset = f.service.schedule_maintenance(f.manager, id, input, None).await.unwrap();
  assert_eq!(asset.next_maintenance(), Some(t0() + Duration::days(30)));

  let bad = MaintenanceScheduleInput {
    interval_days:    -5,
    last_maintenance: None,
    next_maintenance: None,
  };
  let err = f.service.schedule_maintenance(f.manager, id, bad, None).await.unwrap_err();
  assert!(matches!(err, Error::InvalidInterval(-5)));

  f.service
    .update_asset_status(f.manager, id, AssetStatus::Maintenance, None)
    .await
    .unwrap();
  f.clock.advance(Duration::days(2));
  let asset = f
    .service
    .complete_maintenance(f.manager, id, CompleteMaintenance {
      performed_at: None,
      condition:    Some(AssetCondition::Excellent),
      notes:        Some("filters replaced".into()),
    })
    .await
    .unwrap();
  let now = t0() + Duration::days(2);
  assert_eq!(asset.status, AssetStatus::Available);
  assert_eq!(asset.condition, AssetCondition::Excellent);
  assert_eq!(asset.last_maintenance(), Some(now));
  assert_eq!(asset.next_maintenance(), Some(now + Duration::days(30)));

  let err = f
    .service
    .complete_maintenance(f.manager, id, CompleteMaintenance {
      performed_at: Some(now + Duration::days(1)),
      ..CompleteMaintenance::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidDate { field: DateField::MaintenancePerformedAt, .. }));
}

#[tokio::test]
async fn maintenance_due_and_warranty_listings() {
  let f = fixture().await;
  let soon = f.create("SOON").await;
  let later = f.create("LATER").await;
  f.create("NONE").await;

  for (id, interval) in [(soon, 5), (later, 60)] {
    let input = MaintenanceScheduleInput {
      interval_days:    interval,
      last_maintenance: None,
      next_maintenance: None,
    };
    f.service.schedule_maintenance(f.manager, id, input, None).await.unwrap();
  }
  let update = AssetUpdate {
    warranty_expiry: Some(t0() + Duration::days(10)),
    ..AssetUpdate::default()
  };
  f.service.update_asset(f.manager, later, update, None).await.unwrap();

  let due = f.service.list_maintenance_due(f.manager, None, 7).await.unwrap();
  assert_eq!(due.len(), 1);
  assert_eq!(due[0].asset.asset_id, soon);
  assert!(!due[0].insights.maintenance_due);
  assert_eq!(due[0].insights.days_until_next_maintenance, Some(5));

  let expiring = f.service.list_expiring_warranties(f.manager, None, 30).await.unwrap();
  assert_eq!(expiring.len(), 1);
  assert_eq!(expiring[0].asset.asset_id, later);
  assert!(expiring[0].insights.warranty_expiring);

  let err = f.service.list_maintenance_due(f.manager, None, -1).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

// ─── Bulk updates ────────────────────────────────────────────────────────────

#[tokio::test]
async fn bulk_update_skips_foreign_assets_without_failing() {
  let f = fixture().await;
  let owned = f.create("MINE").await;
  let foreign = f.create_in(f.other_manager, f.other_property, "THEIRS").await;
  let missing = Uuid::new_v4();
  f.tick();

  let update = BulkUpdate {
    status:    Some(AssetStatus::Maintenance),
    condition: None,
    location:  Some("Depot".into()),
  };
  let report = f
    .service
    .bulk_update_assets(f.manager, vec![owned, foreign, missing, owned], update, None)
    .await
    .unwrap();

  assert_eq!(report.updated, vec![owned]);
  assert_eq!(report.skipped, vec![
    SkippedAsset { asset_id: foreign, reason: SkipReason::AccessDenied },
    SkippedAsset { asset_id: missing, reason: SkipReason::NotFound },
  ]);

  let mine = f.service.get_asset(f.manager, owned).await.unwrap().asset;
  assert_eq!(mine.status, AssetStatus::Maintenance);
  assert_eq!(mine.location, "Depot");
  assert_eq!(f.actions(owned).await, vec![HistoryAction::BulkUpdate, HistoryAction::Created]);

  let theirs = f.service.get_asset(f.other_manager, foreign).await.unwrap().asset;
  assert_eq!(theirs.status, AssetStatus::Available);
  assert_eq!(theirs.location, "Store room");
}

#[tokio::test]
async fn bulk_update_skips_invalid_transitions() {
  let f = fixture().await;
  let available = f.create("A").await;
  let retired = f.create("R").await;
  f.service.retire_asset(f.manager, retired, None).await.unwrap();

  let update = BulkUpdate { status: Some(AssetStatus::Lost), ..BulkUpdate::default() };
  let report = f
    .service
    .bulk_update_assets(f.manager, vec![available, retired], update, None)
    .await
    .unwrap();
  assert_eq!(report.updated, vec![available]);
  assert_eq!(report.skipped, vec![SkippedAsset {
    asset_id: retired,
    reason:   SkipReason::InvalidTransition {
      from: AssetStatus::Retired,
      to:   AssetStatus::Lost,
    },
  }]);
}

#[tokio::test]
async fn bulk_update_rejects_empty_and_checked_out_targets() {
  let f = fixture().await;
  let id = f.create("A").await;

  let err = f
    .service
    .bulk_update_assets(f.manager, vec![id], BulkUpdate::default(), None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));

  let update = BulkUpdate { status: Some(AssetStatus::CheckedOut), ..BulkUpdate::default() };
  let err = f.service.bulk_update_assets(f.manager, vec![id], update, None).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
  assert_eq!(f.actions(id).await, vec![HistoryAction::Created]);
}

// ─── History paging ──────────────────────────────────────────────────────────

#[tokio::test]
async fn history_pages_through_every_entry() {
  let f = fixture().await;
  let id = f.create("PG-1").await;
  for i in 0..6 {
    f.clock.advance(Duration::minutes(1));
    let update = AssetUpdate { location: Some(format!("Bay {i}")), ..AssetUpdate::default() };
    f.service.update_asset(f.manager, id, update, None).await.unwrap();
  }

  let mut seen = Vec::new();
  let mut cursor: Option<String> = None;
  loop {
    let page = f
      .service
      .list_asset_history(f.manager, id, HistoryFilter::default(), cursor.as_deref(), Some(3))
      .await
      .unwrap();
    assert!(page.page.len() <= 3);
    seen.extend(page.page.iter().map(|e| e.history_id));
    if page.is_done {
      assert!(page.continue_cursor.is_none());
      break;
    }
    cursor = page.continue_cursor;
  }
  assert_eq!(seen.len(), 7);
}

#[tokio::test]
async fn invalid_cursor_restarts_from_first_page() {
  let f = fixture().await;
  let id = f.create("PG-1").await;
  f.clock.advance(Duration::minutes(1));
  f.service.retire_asset(f.manager, id, None).await.unwrap();

  let first = f
    .service
    .list_asset_history(f.manager, id, HistoryFilter::default(), None, Some(1))
    .await
    .unwrap();
  let restarted = f
    .service
    .list_asset_history(f.manager, id, HistoryFilter::default(), Some("not-a-cursor!"), Some(1))
    .await
    .unwrap();
  assert_eq!(first.page, restarted.page);
  assert!(!restarted.is_done);
}

#[tokio::test]
async fn history_rejects_inverted_range() {
  let f = fixture().await;
  let id = f.create("PG-1").await;
  let filter = HistoryFilter {
    from: Some(t0()),
    to: Some(t0() - Duration::days(1)),
    ..HistoryFilter::default()
  };
  let err = f
    .service
    .list_asset_history(f.manager, id, filter, None, None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn dashboard_alerts_and_trend() {
  let f = fixture().await;
  let id = f.create("WR-1").await;
  let update = AssetUpdate {
    warranty_expiry: Some(t0() + Duration::days(10)),
    purchase_price: Some(400.0),
    current_value: Some(250.0),
    ..AssetUpdate::default()
  };
  f.service.update_asset(f.manager, id, update, None).await.unwrap();
  f.service.check_out_asset(f.manager, id, f.check_out_to(f.technician)).await.unwrap();

  let dash = f.service.get_asset_dashboard(f.manager, Some(f.property)).await.unwrap();
  assert_eq!(dash.counts.total, 1);
  assert_eq!(dash.counts.by_status[&AssetStatus::CheckedOut], 1);
  assert_eq!(dash.counts.warranty_expiring, 1);
  assert_eq!(dash.financials.depreciation, 150.0);
  assert_eq!(dash.alerts.len(), 1);
  assert_eq!(dash.alerts[0].kind, AlertKind::WarrantyExpiring);
  assert_eq!(dash.alerts[0].severity, AlertSeverity::Low);

  assert_eq!(dash.utilization_trend.len(), 30);
  let today = dash.utilization_trend.last().unwrap();
  assert_eq!(today.date, t0().date_naive());
  assert_eq!((today.checkouts, today.checkins, today.net_change), (1, 0, 1));

  // Eleven days on, the warranty has lapsed.
  f.clock.advance(Duration::days(11));
  let dash = f.service.get_asset_dashboard(f.manager, None).await.unwrap();
  assert_eq!(dash.counts.warranty_expired, 1);
  assert_eq!(dash.alerts.len(), 1);
  assert_eq!(dash.alerts[0].kind, AlertKind::WarrantyExpired);
  assert_eq!(dash.alerts[0].severity, AlertSeverity::Medium);
  assert!(dash.utilization_trend.iter().map(|p| p.checkouts).sum::<u64>() == 1);
}

#[tokio::test]
async fn dashboard_for_foreign_property_is_denied() {
  let f = fixture().await;
  let err = f
    .service
    .get_asset_dashboard(f.manager, Some(f.other_property))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AccessDenied(_)));
}
