//! Idempotent schema bootstrap for the sightings ledger.
//!
//! Tables are created with `IF NOT EXISTS` so `apply_schema` is safe to
//! call on every process start, against either a fresh file, a fresh
//! in-memory database, or an already-populated one.

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument};

const TABLES: &[(&str, &str)] = &[
    ("sightings", r#"
        CREATE TABLE IF NOT EXISTS sightings (
            encounter_id TEXT PRIMARY KEY,
            species_id INTEGER NOT NULL,
            spawn_id TEXT,
            expire_timestamp INTEGER NOT NULL,
            normalized_timestamp INTEGER NOT NULL,
            lat REAL NOT NULL,
            lon REAL NOT NULL,
            UNIQUE(species_id, normalized_timestamp, lat, lon)
        );
    "#),
    ("longspawn", r#"
        CREATE TABLE IF NOT EXISTS longspawn (
            species_id INTEGER NOT NULL,
            normalized_timestamp INTEGER NOT NULL,
            lat REAL NOT NULL,
            lon REAL NOT NULL,
            encounter_id TEXT NOT NULL,
            expire_timestamp INTEGER NOT NULL,
            PRIMARY KEY(species_id, normalized_timestamp, lat, lon)
        );
    "#),
    ("fort_sightings", r#"
        CREATE TABLE IF NOT EXISTS fort_sightings (
            external_id TEXT PRIMARY KEY,
            lat REAL NOT NULL,
            lon REAL NOT NULL,
            team INTEGER,
            prestige INTEGER,
            guard_species_id INTEGER,
            last_modified INTEGER NOT NULL
        );
    "#),
    ("system_state", r#"
        CREATE TABLE IF NOT EXISTS system_state (
            key TEXT PRIMARY KEY,
            value_text TEXT,
            value_int INTEGER,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#),
];

const INDEXES: &[(&str, &str)] = &[
    ("idx_sightings_expiry", "CREATE INDEX IF NOT EXISTS idx_sightings_expiry ON sightings(expire_timestamp);"),
    ("idx_fort_modified", "CREATE INDEX IF NOT EXISTS idx_fort_modified ON fort_sightings(last_modified);"),
];

#[instrument(skip(conn))]
pub async fn apply_schema(conn: &Connection) -> Result<()> {
    info!("applying sightings ledger schema");
    for (name, sql) in TABLES {
        debug!("creating table: {name}");
        conn.execute(sql, ()).await.with_context(|| format!("failed to create table {name}"))?;
    }
    for (name, sql) in INDEXES {
        debug!("creating index: {name}");
        conn.execute(sql, ()).await.with_context(|| format!("failed to create index {name}"))?;
    }
    Ok(())
}
