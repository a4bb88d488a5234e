//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Counter holding the role version.
pub(crate) const ROLE_VERSION: &str = "role_version";

/// Counter holding the last allocated grant sequence.
pub(crate) const SEQUENCE: &str = "sequence";

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::info!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Principal documents: users and roles as JSON
        CREATE TABLE principals (
            doc_id TEXT PRIMARY KEY,          -- _sync:user:<name> or _sync:role:<name>
            kind TEXT NOT NULL,               -- 'user' or 'role'
            name TEXT NOT NULL,
            body TEXT NOT NULL,               -- JSON document
            updated_at INTEGER NOT NULL
        );

        -- Access view: channel grants derived from documents
        CREATE TABLE access_grants (
            view_key TEXT NOT NULL,           -- principal access_view_key()
            channel TEXT NOT NULL,
            seq INTEGER NOT NULL,             -- earliest granting sequence
            PRIMARY KEY (view_key, channel)
        );

        -- Named monotonic counters
        CREATE TABLE counters (
            name TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        );

        INSERT INTO counters (name, value) VALUES ('role_version', 0);
        INSERT INTO counters (name, value) VALUES ('sequence', 0);

        CREATE INDEX idx_principals_kind_name ON principals(kind, name);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
