//! PrincipalStore trait: the abstract interface for principal persistence.
//!
//! The auth core never touches storage. The gateway loads principals through
//! this trait, hands users an immutable [`RoleSnapshot`], and saves them back
//! after admin changes. Implementations include SQLite and in-memory.

use async_trait::async_trait;
use syncgate_auth::{Principal, Role, RoleSnapshot, User};
use syncgate_core::{Sequence, TimedSet};

use crate::error::Result;

/// The PrincipalStore trait: async interface for principal documents.
///
/// # Design Notes
///
/// - **Documents**: principals are stored as JSON under their `doc_id()`.
///   Attached role sources are never persisted.
/// - **No validation**: callers validate before `put_*`.
/// - **Role version**: every `put_role` and successful `delete_role` bumps a
///   counter. Cached channel snapshots are keyed by it.
/// - **Sequences**: `next_sequence` hands out 1, 2, 3, ... for stamping new
///   grants.
/// - **Access view**: grants derived from documents by the surrounding
///   system, indexed by a principal's `access_view_key()` and merged with the
///   earliest-wins rule.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Principal Documents
    // ─────────────────────────────────────────────────────────────────────────

    /// Load a user by name. The empty name loads the stored guest.
    async fn get_user(&self, name: &str) -> Result<Option<User>>;

    /// Load a role by name.
    async fn get_role(&self, name: &str) -> Result<Option<Role>>;

    /// Insert or replace a user document.
    async fn put_user(&self, user: &User) -> Result<()>;

    /// Insert or replace a role document.
    async fn put_role(&self, role: &Role) -> Result<()>;

    /// Delete a user. Returns true if it existed.
    async fn delete_user(&self, name: &str) -> Result<bool>;

    /// Delete a role. Returns true if it existed.
    async fn delete_role(&self, name: &str) -> Result<bool>;

    /// All user names in lexical order.
    async fn list_users(&self) -> Result<Vec<String>>;

    /// All role names in lexical order.
    async fn list_roles(&self) -> Result<Vec<String>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Counters
    // ─────────────────────────────────────────────────────────────────────────

    /// Current role version.
    async fn role_version(&self) -> Result<u64>;

    /// Allocate the next grant sequence.
    async fn next_sequence(&self) -> Result<Sequence>;

    // ─────────────────────────────────────────────────────────────────────────
    // Access View
    // ─────────────────────────────────────────────────────────────────────────

    /// Merge grants into the access view for `view_key`.
    async fn record_access(&self, view_key: &str, grants: &TimedSet) -> Result<()>;

    /// All access-view grants for `view_key`.
    async fn access_grants(&self, view_key: &str) -> Result<TimedSet>;

    // ─────────────────────────────────────────────────────────────────────────
    // Provided
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot the named roles, stamped with the role version read before
    /// loading them. Names that do not exist are skipped.
    async fn role_snapshot(&self, names: &[String]) -> Result<RoleSnapshot> {
        let version = self.role_version().await?;
        let mut snapshot = RoleSnapshot::new(version);
        for name in names {
            match self.get_role(name).await? {
                Some(role) => snapshot.insert(role),
                None => tracing::debug!(role = %name, "skipping missing role"),
            }
        }
        Ok(snapshot)
    }

    /// Load a user along with a snapshot of its roles.
    async fn load_user(&self, name: &str) -> Result<Option<User>> {
        let Some(user) = self.get_user(name).await? else {
            return Ok(None);
        };
        let snapshot = self.role_snapshot(user.role_names()).await?;
        tracing::trace!(user = user.name(), roles = snapshot.len(), "loaded user");
        Ok(Some(user.with_roles(std::sync::Arc::new(snapshot))))
    }
}
