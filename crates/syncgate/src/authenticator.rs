//! The Authenticator: unified API for channel access.
//!
//! The Authenticator brings together principal storage, role resolution and
//! the authorization checks into the interface the request and admin layers
//! use.

use std::sync::Arc;

use syncgate_auth::{
    Principal, PrincipalDocument, PrincipalKind, Role, RoleSnapshot, User, GUEST_NAME,
};
use syncgate_core::{ChannelSet, Sequence, TimedSet, NO_ACCESS};
use syncgate_store::PrincipalStore;

use crate::error::{GatewayError, Result};

/// Sequence at which the default guest's configured channels are granted.
const GUEST_GRANT_SEQUENCE: Sequence = 1;

/// Configuration for the Authenticator.
#[derive(Debug, Clone)]
pub struct AuthenticatorConfig {
    /// Whether anonymous requests are allowed when no guest document is
    /// stored.
    pub guest_enabled: bool,
    /// Channels granted to the default guest.
    pub guest_channels: ChannelSet,
    /// Whether loading a principal installs a fresh channel snapshot built
    /// from the access view.
    pub rebuild_on_load: bool,
}

impl Default for AuthenticatorConfig {
    fn default() -> Self {
        Self {
            guest_enabled: false,
            guest_channels: ChannelSet::new(),
            rebuild_on_load: false,
        }
    }
}

/// The main Authenticator struct.
///
/// Provides a unified API for:
/// - Loading users with their roles resolved
/// - Password authentication
/// - Creating, saving and deleting principals
/// - Granting and revoking channels and roles
/// - Authorizing replication requests
pub struct Authenticator<S: PrincipalStore> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: AuthenticatorConfig,
}

impl<S: PrincipalStore> Authenticator<S> {
    /// Create a new authenticator.
    pub fn new(store: S, config: AuthenticatorConfig) -> Self {
        Self::with_shared_store(Arc::new(store), config)
    }

    /// Create an authenticator over a store shared with other components.
    pub fn with_shared_store(store: Arc<S>, config: AuthenticatorConfig) -> Self {
        Self { store, config }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    pub fn config(&self) -> &AuthenticatorConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Loading
    // ─────────────────────────────────────────────────────────────────────────

    /// Load a user with a snapshot of its roles attached.
    ///
    /// The empty name returns the stored guest, or the configured default
    /// guest if none is stored.
    pub async fn get_user(&self, name: &str) -> Result<Option<User>> {
        let mut user = match self.store.load_user(name).await? {
            Some(user) => user,
            None if name == GUEST_NAME => {
                let version = self.store.role_version().await?;
                self.default_guest()?
                    .with_roles(Arc::new(RoleSnapshot::new(version)))
            }
            None => return Ok(None),
        };

        if self.config.rebuild_on_load {
            self.rebuild_user_channels(&mut user).await?;
        }
        Ok(Some(user))
    }

    /// Load a role.
    pub async fn get_role(&self, name: &str) -> Result<Option<Role>> {
        let Some(mut role) = self.store.get_role(name).await? else {
            return Ok(None);
        };
        if self.config.rebuild_on_load {
            self.rebuild_role_channels(&mut role).await?;
        }
        Ok(Some(role))
    }

    /// The guest used when no guest document is stored.
    fn default_guest(&self) -> Result<User> {
        let mut guest = User::guest();
        guest.set_explicit_channels(TimedSet::at_sequence(
            self.config.guest_channels.iter().cloned(),
            GUEST_GRANT_SEQUENCE,
        ))?;
        guest.set_disabled(!self.config.guest_enabled);
        Ok(guest)
    }

    /// The guest user, or `None` if anonymous access is disabled.
    pub async fn guest(&self) -> Result<Option<User>> {
        Ok(self
            .get_user(GUEST_NAME)
            .await?
            .filter(|guest| !guest.disabled()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authentication
    // ─────────────────────────────────────────────────────────────────────────

    /// Check a name and password.
    ///
    /// Returns `None` for unknown users, disabled users and wrong
    /// passwords.
    pub async fn authenticate_user(&self, name: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.get_user(name).await? else {
            tracing::info!(user = %name, "authentication failed: unknown user");
            return Ok(None);
        };
        if !user.authenticate(password) {
            tracing::info!(
                user = %name,
                disabled = user.disabled(),
                "authentication failed"
            );
            return Ok(None);
        }
        tracing::debug!(user = %name, "authenticated");
        Ok(Some(user))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admin Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a user granting `channels` at a fresh sequence. Not saved.
    pub async fn new_user(&self, name: &str, password: &str, channels: &ChannelSet) -> Result<User> {
        let grants = self.grant_set(channels).await?;
        Ok(User::new(name, password, grants)?)
    }

    /// Build a role granting `channels` at a fresh sequence. Not saved.
    pub async fn new_role(&self, name: &str, channels: &ChannelSet) -> Result<Role> {
        let grants = self.grant_set(channels).await?;
        Ok(Role::new(name, grants)?)
    }

    /// Create and save a user. Fails if the name is taken.
    pub async fn create_user(
        &self,
        name: &str,
        password: &str,
        channels: &ChannelSet,
    ) -> Result<User> {
        if self.store.get_user(name).await?.is_some() {
            return Err(GatewayError::PrincipalExists {
                kind: PrincipalKind::User,
                name: name.to_string(),
            });
        }
        let user = self.new_user(name, password, channels).await?;
        self.save_user(&user).await?;
        Ok(user)
    }

    /// Create and save a role. Fails if the name is taken.
    pub async fn create_role(&self, name: &str, channels: &ChannelSet) -> Result<Role> {
        if self.store.get_role(name).await?.is_some() {
            return Err(GatewayError::PrincipalExists {
                kind: PrincipalKind::Role,
                name: name.to_string(),
            });
        }
        let role = self.new_role(name, channels).await?;
        self.save_role(&role).await?;
        Ok(role)
    }

    /// Validate and persist a user.
    pub async fn save_user(&self, user: &User) -> Result<()> {
        user.validate()?;
        self.store.put_user(user).await?;
        tracing::info!(user = user.name(), "saved user");
        Ok(())
    }

    /// Validate and persist a role.
    pub async fn save_role(&self, role: &Role) -> Result<()> {
        role.validate()?;
        self.store.put_role(role).await?;
        tracing::info!(role = role.name(), "saved role");
        Ok(())
    }

    /// Delete a user. Returns true if it existed.
    pub async fn delete_user(&self, name: &str) -> Result<bool> {
        Ok(self.store.delete_user(name).await?)
    }

    /// Delete a role. Users naming it silently lose its channels.
    pub async fn delete_role(&self, name: &str) -> Result<bool> {
        Ok(self.store.delete_role(name).await?)
    }

    /// Grant channels to a principal at a fresh sequence.
    ///
    /// Channels the principal already has keep their earlier sequence.
    /// Returns the new explicit grants.
    pub async fn grant_channels(
        &self,
        kind: PrincipalKind,
        name: &str,
        channels: &ChannelSet,
    ) -> Result<TimedSet> {
        let grants = self.grant_set(channels).await?;
        self.update_explicit_channels(kind, name, |explicit| explicit.merge(&grants))
            .await
    }

    /// Remove explicit grants from a principal. Returns the new explicit
    /// grants.
    pub async fn revoke_channels(
        &self,
        kind: PrincipalKind,
        name: &str,
        channels: &ChannelSet,
    ) -> Result<TimedSet> {
        self.update_explicit_channels(kind, name, |explicit| {
            let mut remaining = explicit.clone();
            for channel in channels {
                remaining.remove(channel);
            }
            remaining
        })
        .await
    }

    /// Add roles to a user's explicit roles.
    pub async fn grant_roles(&self, user: &str, roles: &[String]) -> Result<()> {
        let mut doc = self.user_doc(user).await?;
        let names: Vec<String> = doc
            .explicit_role_names()
            .iter()
            .chain(roles)
            .cloned()
            .collect();
        doc.set_explicit_role_names(names)?;
        self.save_user(&doc).await
    }

    /// Remove roles from a user's explicit roles.
    pub async fn revoke_roles(&self, user: &str, roles: &[String]) -> Result<()> {
        let mut doc = self.user_doc(user).await?;
        let names: Vec<String> = doc
            .explicit_role_names()
            .iter()
            .filter(|name| !roles.contains(*name))
            .cloned()
            .collect();
        doc.set_explicit_role_names(names)?;
        self.save_user(&doc).await
    }

    async fn grant_set(&self, channels: &ChannelSet) -> Result<TimedSet> {
        let seq = self.store.next_sequence().await?;
        Ok(TimedSet::at_sequence(channels.iter().cloned(), seq))
    }

    async fn user_doc(&self, name: &str) -> Result<User> {
        self.store
            .get_user(name)
            .await?
            .ok_or_else(|| GatewayError::not_found(PrincipalKind::User, name))
    }

    async fn role_doc(&self, name: &str) -> Result<Role> {
        self.store
            .get_role(name)
            .await?
            .ok_or_else(|| GatewayError::not_found(PrincipalKind::Role, name))
    }

    async fn update_explicit_channels<F>(
        &self,
        kind: PrincipalKind,
        name: &str,
        update: F,
    ) -> Result<TimedSet>
    where
        F: FnOnce(&TimedSet) -> TimedSet,
    {
        match kind {
            PrincipalKind::User => {
                let mut user = self.user_doc(name).await?;
                let explicit = update(user.explicit_channels());
                user.set_explicit_channels(explicit.clone())?;
                self.save_user(&user).await?;
                Ok(explicit)
            }
            PrincipalKind::Role => {
                let mut role = self.role_doc(name).await?;
                let explicit = update(role.explicit_channels());
                role.set_explicit_channels(explicit.clone())?;
                self.save_role(&role).await?;
                Ok(explicit)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Channel Computation
    // ─────────────────────────────────────────────────────────────────────────

    /// Install a snapshot of the user's inherited channels plus its
    /// access-view grants.
    pub async fn rebuild_user_channels(&self, user: &mut User) -> Result<()> {
        let grants = self.store.access_grants(&user.access_view_key()).await?;
        let channels = user.inherited_channels().merge(&grants);
        tracing::debug!(user = user.name(), channels = channels.len(), "rebuilt channels");
        user.set_channels(channels);
        Ok(())
    }

    /// Install a snapshot of the role's explicit channels plus its
    /// access-view grants.
    pub async fn rebuild_role_channels(&self, role: &mut Role) -> Result<()> {
        let grants = self.store.access_grants(&role.access_view_key()).await?;
        let channels = role.explicit_channels().merge(&grants);
        tracing::debug!(role = role.name(), channels = channels.len(), "rebuilt channels");
        role.set_channels(channels);
        Ok(())
    }

    /// Drop the stored channel snapshot for a principal.
    pub async fn invalidate_channels(&self, kind: PrincipalKind, name: &str) -> Result<()> {
        match kind {
            PrincipalKind::User => {
                let mut user = self.user_doc(name).await?;
                user.invalidate_channels();
                self.store.put_user(&user).await?;
            }
            PrincipalKind::Role => {
                let mut role = self.role_doc(name).await?;
                role.invalidate_channels();
                self.store.put_role(&role).await?;
            }
        }
        tracing::debug!(principal = %name, kind = kind.as_str(), "invalidated channels");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    /// Authorize a replication request.
    ///
    /// Expands `"*"`, checks that every requested channel is visible, and
    /// returns the requested grants with the sequence each became visible.
    pub fn authorize_request(&self, user: &User, requested: &ChannelSet) -> Result<TimedSet> {
        if user.disabled() {
            let message = if user.is_guest() {
                "login required"
            } else {
                "account disabled"
            };
            return Err(user.unauth_error(message).into());
        }
        let channels = user.expand_wildcard_channel(requested);
        user.authorize_all_channels(&channels)?;
        Ok(user.channels().restrict_to(&channels))
    }

    /// Check a single channel, answering with the right error class.
    pub fn authorize_channel(&self, user: &User, channel: &str) -> Result<Sequence> {
        match user.can_see_channel_since(channel) {
            NO_ACCESS => Err(GatewayError::Auth(
                user.unauth_error(&format!("no access to channel {channel:?}")),
            )),
            seq => Ok(seq),
        }
    }
}
