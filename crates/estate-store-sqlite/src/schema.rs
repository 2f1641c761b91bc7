//! SQL schema for the estate SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id      TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    email        TEXT NOT NULL,
    role         TEXT NOT NULL,   -- 'manager' | 'field_technician' | 'tenant'
    property_ids TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS properties (
    property_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    manager_id  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assets (
    asset_id                  TEXT PRIMARY KEY,
    property_id               TEXT NOT NULL,
    asset_tag                 TEXT NOT NULL UNIQUE,
    name                      TEXT NOT NULL,
    description               TEXT NOT NULL DEFAULT '',
    category                  TEXT NOT NULL,
    subcategory               TEXT,
    brand                     TEXT,
    model                     TEXT,
    serial_number             TEXT,
    purchase_date             TEXT,
    purchase_price            REAL,
    current_value             REAL,
    condition                 TEXT NOT NULL,
    status                    TEXT NOT NULL,
    location                  TEXT NOT NULL,
    assigned_to               TEXT,
    assigned_at               TEXT,
    maintenance_interval_days INTEGER,   -- NULL when no schedule is set
    last_maintenance          TEXT,
    next_maintenance          TEXT,
    warranty_expiry           TEXT,
    created_at                TEXT NOT NULL,
    updated_at                TEXT NOT NULL,
    CHECK ((status = 'checked_out') = (assigned_to IS NOT NULL))
);

-- History entries are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS asset_history (
    history_id    TEXT PRIMARY KEY,
    asset_id      TEXT NOT NULL REFERENCES assets(asset_id),
    property_id   TEXT NOT NULL,
    action        TEXT NOT NULL,
    from_user     TEXT,
    to_user       TEXT,
    from_location TEXT,
    to_location   TEXT,
    notes         TEXT,
    timestamp     TEXT NOT NULL,   -- fixed-width RFC 3339, sorts lexically
    performed_by  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS assets_property_idx   ON assets(property_id);
CREATE INDEX IF NOT EXISTS properties_manager_idx ON properties(manager_id);
CREATE INDEX IF NOT EXISTS history_asset_idx
    ON asset_history(asset_id, timestamp, history_id);
CREATE INDEX IF NOT EXISTS history_property_action_idx
    ON asset_history(property_id, action, timestamp);

PRAGMA user_version = 1;
";
