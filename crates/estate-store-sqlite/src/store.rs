//! [`SqliteStore`], the SQLite implementation of [`AssetStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use estate_core::{
  asset::Asset,
  directory::{Property, User},
  history::{HistoryCount, HistoryEntry, HistoryQuery},
  store::{AssetGuard, AssetQuery, AssetStore},
};

use crate::{
  Error, Result,
  encode::{
    ASSET_COLUMNS, HISTORY_COLUMNS, RawAsset, RawHistoryEntry, RawProperty, RawUser,
    encode_dt, encode_ids, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An estate record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store. Data is lost on drop.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_asset(&self, column: &'static str, value: String) -> Result<Option<Asset>> {
    let raw: Option<RawAsset> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE {column} = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![value], RawAsset::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAsset::into_asset).transpose()
  }
}

/// Result of a guarded asset write.
enum WriteOutcome {
  Applied,
  Stale,
  Missing,
}

/// `?n, ?n+1, …` for an `IN (…)` list starting at parameter `first`.
fn placeholders(first: usize, count: usize) -> String {
  (first..first + count)
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ")
}

/// `%term%` with LIKE wildcards in `term` escaped by `\`.
fn like_pattern(term: &str) -> String {
  let mut pattern = String::with_capacity(term.len() + 2);
  pattern.push('%');
  for c in term.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

fn insert_history(conn: &rusqlite::Connection, raw: &RawHistoryEntry) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO asset_history (
       history_id, asset_id, property_id, action, from_user, to_user,
       from_location, to_location, notes, timestamp, performed_by
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    rusqlite::params![
      raw.history_id,
      raw.asset_id,
      raw.property_id,
      raw.action,
      raw.from_user,
      raw.to_user,
      raw.from_location,
      raw.to_location,
      raw.notes,
      raw.timestamp,
      raw.performed_by,
    ],
  )?;
  Ok(())
}

// ─── AssetStore impl ─────────────────────────────────────────────────────────

impl AssetStore for SqliteStore {
  type Error = Error;

  // ── Directory ─────────────────────────────────────────────────────────────

  async fn put_user(&self, user: User) -> Result<()> {
    let id_str = encode_uuid(user.user_id);
    let role_str = user.role.as_ref().to_owned();
    let ids_str = encode_ids(&user.property_ids)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, name, email, role, property_ids)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (user_id) DO UPDATE SET
             name = excluded.name,
             email = excluded.email,
             role = excluded.role,
             property_ids = excluded.property_ids",
          rusqlite::params![id_str, user.name, user.email, role_str, ids_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, name, email, role, property_ids FROM users WHERE user_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawUser {
                  user_id:      row.get(0)?,
                  name:         row.get(1)?,
                  email:        row.get(2)?,
                  role:         row.get(3)?,
                  property_ids: row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn put_property(&self, property: Property) -> Result<()> {
    let id_str = encode_uuid(property.property_id);
    let manager_str = encode_uuid(property.manager_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO properties (property_id, name, manager_id) VALUES (?1, ?2, ?3)
           ON CONFLICT (property_id) DO UPDATE SET
             name = excluded.name,
             manager_id = excluded.manager_id",
          rusqlite::params![id_str, property.name, manager_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_property(&self, id: Uuid) -> Result<Option<Property>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProperty> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT property_id, name, manager_id FROM properties WHERE property_id = ?1",
              rusqlite::params![id_str],
              RawProperty::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProperty::into_property).transpose()
  }

  async fn list_managed_properties(&self, manager_id: Uuid) -> Result<Vec<Property>> {
    let manager_str = encode_uuid(manager_id);

    let raws: Vec<RawProperty> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT property_id, name, manager_id FROM properties
           WHERE manager_id = ?1 ORDER BY name, property_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![manager_str], RawProperty::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProperty::into_property).collect()
  }

  // ── Assets ────────────────────────────────────────────────────────────────

  async fn get_asset(&self, id: Uuid) -> Result<Option<Asset>> {
    self.query_asset("asset_id", encode_uuid(id)).await
  }

  async fn find_asset_by_tag(&self, asset_tag: &str) -> Result<Option<Asset>> {
    self.query_asset("asset_tag", asset_tag.to_owned()).await
  }

  async fn list_assets(&self, query: &AssetQuery) -> Result<Vec<Asset>> {
    if query.property_ids.is_empty() {
      return Ok(Vec::new());
    }

    let mut params: Vec<String> = query.property_ids.iter().copied().map(encode_uuid).collect();
    let mut conds = vec![format!("property_id IN ({})", placeholders(1, params.len()))];

    let mut push = |cond: &str, value: String| {
      params.push(value);
      conds.push(cond.replace("?", &format!("?{}", params.len())));
    };
    if let Some(status) = query.status {
      push("status = ?", status.as_ref().to_owned());
    }
    if let Some(category) = query.category {
      push("category = ?", category.as_ref().to_owned());
    }
    if let Some(condition) = query.condition {
      push("condition = ?", condition.as_ref().to_owned());
    }
    if let Some(location) = &query.location {
      push("location = ?", location.clone());
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
      push(
        "(name LIKE ? ESCAPE '\\' OR asset_tag LIKE ? ESCAPE '\\' \
         OR description LIKE ? ESCAPE '\\' OR serial_number LIKE ? ESCAPE '\\')",
        like_pattern(search),
      );
    }

    // LIMIT -1 is SQLite's "no limit".
    let limit = query.limit.map_or(-1, |l| l as i64);
    let offset = query.offset.unwrap_or(0) as i64;
    let sql = format!(
      "SELECT {ASSET_COLUMNS} FROM assets
       WHERE {}
       ORDER BY created_at DESC, asset_id
       LIMIT {limit} OFFSET {offset}",
      conds.join(" AND ")
    );
    debug!(%sql, params = params.len(), "listing assets");

    let raws: Vec<RawAsset> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawAsset::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAsset::into_asset).collect()
  }

  async fn insert_asset(&self, asset: Asset, entry: HistoryEntry) -> Result<()> {
    let raw = RawAsset::encode(&asset);
    let raw_entry = RawHistoryEntry::encode(&entry);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!(
            "INSERT INTO assets ({ASSET_COLUMNS}) VALUES (
               ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
               ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24
             )"
          ),
          rusqlite::params![
            raw.asset_id,
            raw.property_id,
            raw.asset_tag,
            raw.name,
            raw.description,
            raw.category,
            raw.subcategory,
            raw.brand,
            raw.model,
            raw.serial_number,
            raw.purchase_date,
            raw.purchase_price,
            raw.current_value,
            raw.condition,
            raw.status,
            raw.location,
            raw.assigned_to,
            raw.assigned_at,
            raw.maintenance_interval_days,
            raw.last_maintenance,
            raw.next_maintenance,
            raw.warranty_expiry,
            raw.created_at,
            raw.updated_at,
          ],
        )?;
        insert_history(&tx, &raw_entry)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    debug!(asset_id = %asset.asset_id, history_id = %entry.history_id, "asset inserted");
    Ok(())
  }

  async fn update_asset(
    &self,
    expected: AssetGuard,
    asset: Asset,
    entry: HistoryEntry,
  ) -> Result<bool> {
    let raw = RawAsset::encode(&asset);
    let raw_entry = RawHistoryEntry::encode(&entry);
    let expected_status = expected.status.as_ref().to_owned();
    let expected_assignee = expected.assigned_to.map(encode_uuid);
    let expected_updated_at = encode_dt(expected.updated_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE assets SET
             property_id = ?2, asset_tag = ?3, name = ?4, description = ?5,
             category = ?6, subcategory = ?7, brand = ?8, model = ?9,
             serial_number = ?10, purchase_date = ?11, purchase_price = ?12,
             current_value = ?13, condition = ?14, status = ?15, location = ?16,
             assigned_to = ?17, assigned_at = ?18, maintenance_interval_days = ?19,
             last_maintenance = ?20, next_maintenance = ?21, warranty_expiry = ?22,
             updated_at = ?23
           WHERE asset_id = ?1
             AND status = ?24 AND assigned_to IS ?25 AND updated_at = ?26",
          rusqlite::params![
            raw.asset_id,
            raw.property_id,
            raw.asset_tag,
            raw.name,
            raw.description,
            raw.category,
            raw.subcategory,
            raw.brand,
            raw.model,
            raw.serial_number,
            raw.purchase_date,
            raw.purchase_price,
            raw.current_value,
            raw.condition,
            raw.status,
            raw.location,
            raw.assigned_to,
            raw.assigned_at,
            raw.maintenance_interval_days,
            raw.last_maintenance,
            raw.next_maintenance,
            raw.warranty_expiry,
            raw.updated_at,
            expected_status,
            expected_assignee,
            expected_updated_at,
          ],
        )?;
        // Dropping the transaction without commit rolls it back.
        if changed == 0 {
          let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM assets WHERE asset_id = ?1)",
            rusqlite::params![raw.asset_id],
            |row| row.get(0),
          )?;
          return Ok(if exists { WriteOutcome::Stale } else { WriteOutcome::Missing });
        }
        insert_history(&tx, &raw_entry)?;
        tx.commit()?;
        Ok(WriteOutcome::Applied)
      })
      .await?;

    match outcome {
      WriteOutcome::Applied => {
        debug!(asset_id = %asset.asset_id, history_id = %entry.history_id, "asset updated");
        Ok(true)
      }
      WriteOutcome::Stale => {
        debug!(asset_id = %asset.asset_id, "stored asset no longer matches guard");
        Ok(false)
      }
      WriteOutcome::Missing => Err(Error::AssetNotFound(asset.asset_id)),
    }
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn get_history_entry(&self, id: Uuid) -> Result<Option<HistoryEntry>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawHistoryEntry> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {HISTORY_COLUMNS} FROM asset_history WHERE history_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawHistoryEntry::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawHistoryEntry::into_entry).transpose()
  }

  async fn list_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryEntry>> {
    let asset_str = encode_uuid(query.asset_id);
    let action_str = query.filter.action.as_ref().map(|a| a.as_tag());
    let from_str = query.filter.from.map(encode_dt);
    let to_str = query.filter.to.map(encode_dt);
    let by_str = query.filter.performed_by.map(encode_uuid);
    let after_ts = query.after.map(|c| encode_dt(c.timestamp));
    let after_id = query.after.map(|c| encode_uuid(c.history_id));
    let limit = query.limit as i64;

    let raws: Vec<RawHistoryEntry> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {HISTORY_COLUMNS} FROM asset_history
           WHERE asset_id = ?1
             AND (?2 IS NULL OR action = ?2)
             AND (?3 IS NULL OR timestamp >= ?3)
             AND (?4 IS NULL OR timestamp <= ?4)
             AND (?5 IS NULL OR performed_by = ?5)
             AND (?6 IS NULL OR timestamp < ?6 OR (timestamp = ?6 AND history_id < ?7))
           ORDER BY timestamp DESC, history_id DESC
           LIMIT ?8"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              asset_str, action_str, from_str, to_str, by_str, after_ts, after_id, limit,
            ],
            RawHistoryEntry::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawHistoryEntry::into_entry).collect()
  }

  async fn count_history(&self, query: &HistoryCount) -> Result<u64> {
    if query.property_ids.is_empty() {
      return Ok(0);
    }

    let mut params: Vec<String> = query.property_ids.iter().copied().map(encode_uuid).collect();
    let n = params.len();
    params.push(query.action.as_tag());
    params.push(encode_dt(query.from));
    params.push(encode_dt(query.until));
    let sql = format!(
      "SELECT COUNT(*) FROM asset_history
       WHERE property_id IN ({})
         AND action = ?{}
         AND timestamp >= ?{} AND timestamp < ?{}",
      placeholders(1, n),
      n + 1,
      n + 2,
      n + 3,
    );

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| row.get(0))?)
      })
      .await?;

    Ok(count.max(0) as u64)
  }
}
