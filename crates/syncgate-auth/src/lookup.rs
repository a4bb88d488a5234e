//! Role resolution.
//!
//! Users hold role names, never roles. A [`RoleLookup`] resolves a name to
//! the role's current state at query time; a name that does not resolve
//! simply contributes nothing.

use std::collections::HashMap;

use crate::principal::Principal;
use crate::role::Role;

/// Resolves role names to roles.
pub trait RoleLookup: Send + Sync {
    /// The role called `name`, if it exists.
    fn role(&self, name: &str) -> Option<Role>;

    /// A token that changes whenever any role changes.
    ///
    /// Cached channel snapshots are only trusted while this is unchanged.
    fn version(&self) -> u64;

    /// Resolve `names` in order, `None` where a name does not resolve.
    ///
    /// Implementations backed by mutable state resolve every name against
    /// one consistent view.
    fn roles(&self, names: &[String]) -> Vec<Option<Role>> {
        names.iter().map(|name| self.role(name)).collect()
    }
}

/// An immutable set of roles captured at one role-store version.
#[derive(Debug, Clone, Default)]
pub struct RoleSnapshot {
    roles: HashMap<String, Role>,
    version: u64,
}

impl RoleSnapshot {
    /// Create an empty snapshot at `version`.
    pub fn new(version: u64) -> Self {
        Self {
            roles: HashMap::new(),
            version,
        }
    }

    /// Build a snapshot from a collection of roles.
    pub fn from_roles(roles: impl IntoIterator<Item = Role>, version: u64) -> Self {
        let mut snapshot = Self::new(version);
        for role in roles {
            snapshot.insert(role);
        }
        snapshot
    }

    /// Add or replace a role.
    pub fn insert(&mut self, role: Role) {
        self.roles.insert(role.name().to_string(), role);
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleLookup for RoleSnapshot {
    fn role(&self, name: &str) -> Option<Role> {
        self.roles.get(name).cloned()
    }

    fn version(&self) -> u64 {
        self.version
    }
}
