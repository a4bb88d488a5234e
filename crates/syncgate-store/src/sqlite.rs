//! SQLite implementation of the PrincipalStore trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use syncgate_auth::{Principal, PrincipalDocument, PrincipalKind, Role, User};
use syncgate_core::{Sequence, TimedSet};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis, ROLE_VERSION, SEQUENCE};
use crate::traits::PrincipalStore;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
    }

    async fn get_doc<T>(&self, kind: PrincipalKind, name: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let doc_id = kind.doc_id(name);
        self.blocking(move |conn| {
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM principals WHERE doc_id = ?1",
                    params![doc_id],
                    |row| row.get(0),
                )
                .optional()?;
            body.map(|b| serde_json::from_str(&b))
                .transpose()
                .map_err(StoreError::from)
        })
        .await
    }

    async fn put_doc<P>(&self, principal: &P) -> Result<()>
    where
        P: PrincipalDocument + serde::Serialize,
    {
        let kind = principal.kind();
        let doc_id = principal.doc_id();
        let name = principal.name().to_string();
        let body = serde_json::to_string(principal)?;

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO principals (doc_id, kind, name, body, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(doc_id) DO UPDATE SET body = excluded.body,
                                                   updated_at = excluded.updated_at",
                params![doc_id, kind.as_str(), name, body, now_millis()],
            )?;
            if kind == PrincipalKind::Role {
                bump_counter(&tx, ROLE_VERSION)?;
            }
            tx.commit()?;
            tracing::debug!(doc_id = %doc_id, "stored principal");
            Ok(())
        })
        .await
    }

    async fn delete_doc(&self, kind: PrincipalKind, name: &str) -> Result<bool> {
        let doc_id = kind.doc_id(name);
        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let removed =
                tx.execute("DELETE FROM principals WHERE doc_id = ?1", params![doc_id])? > 0;
            if removed && kind == PrincipalKind::Role {
                bump_counter(&tx, ROLE_VERSION)?;
            }
            tx.commit()?;
            if removed {
                tracing::debug!(doc_id = %doc_id, "deleted principal");
            }
            Ok(removed)
        })
        .await
    }

    async fn list(&self, kind: PrincipalKind) -> Result<Vec<String>> {
        self.blocking(move |conn| {
            let mut stmt =
                conn.prepare("SELECT name FROM principals WHERE kind = ?1 ORDER BY name")?;
            let names = stmt
                .query_map(params![kind.as_str()], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(names)
        })
        .await
    }
}

fn read_counter(conn: &Connection, name: &str) -> Result<u64> {
    let value: i64 = conn.query_row(
        "SELECT value FROM counters WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    u64::try_from(value).map_err(|_| StoreError::InvalidData(format!("negative counter {name}")))
}

fn bump_counter(conn: &Connection, name: &str) -> Result<u64> {
    conn.execute(
        "UPDATE counters SET value = value + 1 WHERE name = ?1",
        params![name],
    )?;
    read_counter(conn, name)
}

#[async_trait]
impl PrincipalStore for SqliteStore {
    async fn get_user(&self, name: &str) -> Result<Option<User>> {
        self.get_doc(PrincipalKind::User, name).await
    }

    async fn get_role(&self, name: &str) -> Result<Option<Role>> {
        self.get_doc(PrincipalKind::Role, name).await
    }

    async fn put_user(&self, user: &User) -> Result<()> {
        self.put_doc(user).await
    }

    async fn put_role(&self, role: &Role) -> Result<()> {
        self.put_doc(role).await
    }

    async fn delete_user(&self, name: &str) -> Result<bool> {
        self.delete_doc(PrincipalKind::User, name).await
    }

    async fn delete_role(&self, name: &str) -> Result<bool> {
        self.delete_doc(PrincipalKind::Role, name).await
    }

    async fn list_users(&self) -> Result<Vec<String>> {
        self.list(PrincipalKind::User).await
    }

    async fn list_roles(&self) -> Result<Vec<String>> {
        self.list(PrincipalKind::Role).await
    }

    async fn role_version(&self) -> Result<u64> {
        self.blocking(|conn| read_counter(conn, ROLE_VERSION)).await
    }

    async fn next_sequence(&self) -> Result<Sequence> {
        self.blocking(|conn| {
            let tx = conn.transaction()?;
            let seq = bump_counter(&tx, SEQUENCE)?;
            tx.commit()?;
            Ok(seq)
        })
        .await
    }

    async fn record_access(&self, view_key: &str, grants: &TimedSet) -> Result<()> {
        let view_key = view_key.to_string();
        let rows: Vec<(String, i64)> = grants
            .iter()
            .filter(|&(_, seq)| seq > 0)
            .map(|(channel, seq)| {
                i64::try_from(seq)
                    .map(|seq| (channel.to_string(), seq))
                    .map_err(|_| StoreError::InvalidData(format!("sequence {seq} out of range")))
            })
            .collect::<Result<_>>()?;

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO access_grants (view_key, channel, seq) VALUES (?1, ?2, ?3)
                     ON CONFLICT(view_key, channel) DO UPDATE SET seq = MIN(seq, excluded.seq)",
                )?;
                for (channel, seq) in &rows {
                    stmt.execute(params![view_key, channel, seq])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn access_grants(&self, view_key: &str) -> Result<TimedSet> {
        let view_key = view_key.to_string();
        self.blocking(move |conn| {
            let mut stmt =
                conn.prepare("SELECT channel, seq FROM access_grants WHERE view_key = ?1")?;
            let rows = stmt
                .query_map(params![view_key], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(channel, seq)| {
                    u64::try_from(seq)
                        .map(|seq| (channel, seq))
                        .map_err(|_| StoreError::InvalidData(format!("negative sequence {seq}")))
                })
                .collect::<Result<Vec<_>>>()
                .map(|grants| grants.into_iter().collect::<TimedSet>())
        })
        .await
    }
}
