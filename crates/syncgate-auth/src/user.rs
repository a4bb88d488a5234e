//! Users: principals that can log in and belong to roles.
//!
//! A user's effective channels are its own explicit grants merged with the
//! channels of every role it names. Role membership is one level deep:
//! roles never name other roles. Roles are resolved through an attached
//! [`RoleLookup`] each time the inherited set is computed, so changes to a
//! role are seen without any invalidation step.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use syncgate_core::{
    contains_wildcard, is_valid_email, validate_principal_name, validate_role_name, ChannelSet,
    TimedSet, ValidationError,
};

use crate::credential::Credential;
use crate::error::Result;
use crate::lookup::RoleLookup;
use crate::principal::{
    ChannelSnapshot, Principal, PrincipalBase, PrincipalDocument, PrincipalKind, GUEST_NAME,
};

/// A principal with credentials, an enabled flag and role membership.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    base: PrincipalBase,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,

    #[serde(default)]
    disabled: bool,

    #[serde(rename = "passwordhash", default, skip_serializing_if = "Option::is_none")]
    credential: Option<Credential>,

    #[serde(rename = "admin_roles", default)]
    explicit_roles: Vec<String>,

    #[serde(skip)]
    roles: Option<Arc<dyn RoleLookup>>,
}

impl User {
    /// Create a user with a password and explicit grants.
    ///
    /// An empty password leaves the user unable to log in by password.
    pub fn new(name: impl Into<String>, password: &str, channels: TimedSet) -> Result<Self> {
        let mut user = Self {
            base: PrincipalBase::new(name, channels),
            ..Self::default()
        };
        user.set_password(password);
        user.validate()?;
        Ok(user)
    }

    /// The anonymous guest user: no name, no password, no grants.
    pub fn guest() -> Self {
        Self {
            base: PrincipalBase::new(GUEST_NAME, TimedSet::new()),
            ..Self::default()
        }
    }

    /// Attach the source used to resolve role names.
    pub fn with_roles(mut self, lookup: Arc<dyn RoleLookup>) -> Self {
        self.attach_roles(lookup);
        self
    }

    /// Attach the source used to resolve role names.
    pub fn attach_roles(&mut self, lookup: Arc<dyn RoleLookup>) {
        self.roles = Some(lookup);
    }

    /// The attached role source, if any.
    pub fn role_lookup(&self) -> Option<&Arc<dyn RoleLookup>> {
        self.roles.as_ref()
    }

    fn role_version(&self) -> Option<u64> {
        self.roles.as_ref().map(|lookup| lookup.version())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Account
    // ─────────────────────────────────────────────────────────────────────────

    /// The user's email address, if set.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Set the email address. An empty string clears it.
    pub fn set_email(&mut self, email: &str) -> Result<()> {
        if email.is_empty() {
            self.email = None;
            return Ok(());
        }
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()).into());
        }
        self.email = Some(email.to_string());
        Ok(())
    }

    /// Whether the account is disabled.
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Check a password. Always false for a disabled user, an empty
    /// password, or a user without a password.
    pub fn authenticate(&self, password: &str) -> bool {
        if self.disabled || password.is_empty() {
            return false;
        }
        self.credential
            .as_ref()
            .map_or(false, |credential| credential.verify(password))
    }

    /// Change the password. An empty password removes the credential.
    pub fn set_password(&mut self, password: &str) {
        self.credential = if password.is_empty() {
            None
        } else {
            Some(Credential::hash(password))
        };
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────────

    /// Every role the user belongs to. Equal to the explicit roles.
    pub fn role_names(&self) -> &[String] {
        &self.explicit_roles
    }

    /// Roles assigned through the admin API.
    pub fn explicit_role_names(&self) -> &[String] {
        &self.explicit_roles
    }

    /// Replace the explicit roles. Duplicates collapse; every name must be a
    /// valid, non-empty principal name.
    pub fn set_explicit_role_names<I, S>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        for name in &names {
            validate_role_name(name)?;
        }
        self.set_role_names(names.into_iter().collect());
        self.base.snapshot = None;
        Ok(())
    }

    /// Raw setter for rehydration. Performs no validation or deduplication.
    pub fn set_role_names(&mut self, names: Vec<String>) {
        self.explicit_roles = names;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Channels
    // ─────────────────────────────────────────────────────────────────────────

    /// Explicit grants merged with the channels of every named role.
    ///
    /// Role names that do not resolve contribute nothing.
    pub fn inherited_channels(&self) -> TimedSet {
        let mut channels = self.base.explicit_channels.clone();
        let Some(lookup) = &self.roles else {
            return channels;
        };
        let roles = lookup.roles(&self.explicit_roles);
        for (name, role) in self.explicit_roles.iter().zip(roles) {
            match role {
                Some(role) => {
                    channels.merge_in(&role.channels());
                }
                None => tracing::debug!(user = %self.base.name, role = %name, "role not found"),
            }
        }
        channels
    }

    /// Replace a request containing `"*"` with every inherited channel name.
    /// Any other request is returned as is.
    pub fn expand_wildcard_channel(&self, channels: &ChannelSet) -> ChannelSet {
        if contains_wildcard(channels) {
            self.inherited_channels().as_set()
        } else {
            channels.clone()
        }
    }

    /// The inherited grants for the requested channels. `"*"` selects every
    /// channel; names the user cannot see are left out.
    pub fn filter_to_available_channels(&self, channels: &ChannelSet) -> TimedSet {
        let inherited = self.inherited_channels();
        if contains_wildcard(channels) {
            inherited
        } else {
            inherited.restrict_to(channels)
        }
    }
}

impl Principal for User {
    fn name(&self) -> &str {
        &self.base.name
    }

    /// A snapshot installed at the current role version, or the live
    /// inherited channels.
    fn channels(&self) -> TimedSet {
        self.base
            .snapshot_at(self.role_version())
            .unwrap_or_else(|| self.inherited_channels())
    }

    fn explicit_channels(&self) -> &TimedSet {
        &self.base.explicit_channels
    }

    fn set_explicit_channels(&mut self, channels: TimedSet) -> Result<()> {
        self.base.set_explicit_channels(channels)
    }
}

impl PrincipalDocument for User {
    fn kind(&self) -> PrincipalKind {
        PrincipalKind::User
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_principal_name(&self.base.name)?;
        self.base.validate_channels()?;
        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                return Err(ValidationError::InvalidEmail(email.clone()));
            }
        }
        for role in &self.explicit_roles {
            validate_role_name(role)?;
        }
        Ok(())
    }

    fn set_channels(&mut self, channels: TimedSet) {
        self.base.snapshot = Some(ChannelSnapshot {
            channels,
            role_version: self.role_version(),
        });
    }

    fn invalidate_channels(&mut self) {
        self.base.snapshot = None;
    }
}

impl PartialEq for User {
    /// Compares persisted state; the attached role source is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base
            && self.email == other.email
            && self.disabled == other.disabled
            && self.credential == other.credential
            && self.explicit_roles == other.explicit_roles
    }
}

impl Eq for User {}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("name", &self.base.name)
            .field("explicit_channels", &self.base.explicit_channels)
            .field("email", &self.email)
            .field("disabled", &self.disabled)
            .field("has_password", &self.credential.is_some())
            .field("explicit_roles", &self.explicit_roles)
            .field("role_version", &self.role_version())
            .finish()
    }
}
