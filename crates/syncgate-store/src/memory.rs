//! In-memory implementation of the PrincipalStore trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! (documents are kept as JSON text) but nothing is persisted.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use syncgate_auth::{PrincipalDocument, PrincipalKind, Role, RoleLookup, User};
use syncgate_core::{Sequence, TimedSet};

use crate::error::{Result, StoreError};
use crate::traits::PrincipalStore;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
///
/// Also implements [`RoleLookup`] directly, giving a live view of the stored
/// roles for callers that do not need a snapshot.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// JSON documents indexed by doc_id.
    docs: BTreeMap<String, String>,

    /// Access view: view key -> grants.
    access: HashMap<String, TimedSet>,

    role_version: u64,

    /// Last sequence handed out.
    sequence: Sequence,
}

impl MemoryStoreInner {
    fn get<T: DeserializeOwned>(&self, doc_id: &str) -> Result<Option<T>> {
        self.docs
            .get(doc_id)
            .map(|body| serde_json::from_str(body))
            .transpose()
            .map_err(StoreError::from)
    }

    fn names(&self, kind: PrincipalKind) -> Vec<String> {
        let prefix = kind.doc_id("");
        self.docs
            .keys()
            .filter_map(|id| id.strip_prefix(prefix.as_str()))
            .map(str::to_string)
            .collect()
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl PrincipalStore for MemoryStore {
    async fn get_user(&self, name: &str) -> Result<Option<User>> {
        self.read()?.get(&PrincipalKind::User.doc_id(name))
    }

    async fn get_role(&self, name: &str) -> Result<Option<Role>> {
        self.read()?.get(&PrincipalKind::Role.doc_id(name))
    }

    async fn put_user(&self, user: &User) -> Result<()> {
        let body = serde_json::to_string(user)?;
        self.write()?.docs.insert(user.doc_id(), body);
        Ok(())
    }

    async fn put_role(&self, role: &Role) -> Result<()> {
        let body = serde_json::to_string(role)?;
        let mut inner = self.write()?;
        inner.docs.insert(role.doc_id(), body);
        inner.role_version += 1;
        Ok(())
    }

    async fn delete_user(&self, name: &str) -> Result<bool> {
        let removed = self
            .write()?
            .docs
            .remove(&PrincipalKind::User.doc_id(name));
        Ok(removed.is_some())
    }

    async fn delete_role(&self, name: &str) -> Result<bool> {
        let mut inner = self.write()?;
        let removed = inner.docs.remove(&PrincipalKind::Role.doc_id(name)).is_some();
        if removed {
            inner.role_version += 1;
        }
        Ok(removed)
    }

    async fn list_users(&self) -> Result<Vec<String>> {
        Ok(self.read()?.names(PrincipalKind::User))
    }

    async fn list_roles(&self) -> Result<Vec<String>> {
        Ok(self.read()?.names(PrincipalKind::Role))
    }

    async fn role_version(&self) -> Result<u64> {
        Ok(self.read()?.role_version)
    }

    async fn next_sequence(&self) -> Result<Sequence> {
        let mut inner = self.write()?;
        inner.sequence += 1;
        Ok(inner.sequence)
    }

    async fn record_access(&self, view_key: &str, grants: &TimedSet) -> Result<()> {
        self.write()?
            .access
            .entry(view_key.to_string())
            .or_default()
            .merge_in(grants);
        Ok(())
    }

    async fn access_grants(&self, view_key: &str) -> Result<TimedSet> {
        Ok(self
            .read()?
            .access
            .get(view_key)
            .cloned()
            .unwrap_or_default())
    }
}

impl MemoryStoreInner {
    fn role(&self, name: &str) -> Option<Role> {
        match self.get(&PrincipalKind::Role.doc_id(name)) {
            Ok(role) => role,
            Err(e) => {
                tracing::warn!(role = %name, error = %e, "unreadable role document");
                None
            }
        }
    }
}

impl RoleLookup for MemoryStore {
    fn role(&self, name: &str) -> Option<Role> {
        self.inner.read().ok()?.role(name)
    }

    /// All names are resolved under a single read guard, so a concurrent
    /// `put_role` is seen by all of them or none.
    fn roles(&self, names: &[String]) -> Vec<Option<Role>> {
        match self.inner.read() {
            Ok(inner) => names.iter().map(|name| inner.role(name)).collect(),
            Err(_) => vec![None; names.len()],
        }
    }

    fn version(&self) -> u64 {
        self.inner.read().map(|inner| inner.role_version).unwrap_or(0)
    }
}
