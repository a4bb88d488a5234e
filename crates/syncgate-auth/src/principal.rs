//! The shared principal contract.
//!
//! A principal is anything that can hold channel grants: a [`Role`] or a
//! [`User`]. Both embed a [`PrincipalBase`] holding the name, the explicit
//! (admin-assigned) grants and an optional cached snapshot of the effective
//! grants.
//!
//! [`Role`]: crate::role::Role
//! [`User`]: crate::user::User

use serde::{Deserialize, Serialize};
use syncgate_core::{ChannelSet, Sequence, TimedSet, ValidationError, NO_ACCESS};

use crate::error::{AuthError, Result};

/// Name of the anonymous guest principal.
pub const GUEST_NAME: &str = "";

/// Which variant of principal a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Role,
}

impl PrincipalKind {
    /// Storage key of the principal document.
    pub fn doc_id(self, name: &str) -> String {
        match self {
            PrincipalKind::User => format!("_sync:user:{}", name),
            PrincipalKind::Role => format!("_sync:role:{}", name),
        }
    }

    /// Key under which the access view indexes grants for this principal.
    pub fn access_view_key(self, name: &str) -> String {
        match self {
            PrincipalKind::User => name.to_string(),
            PrincipalKind::Role => format!("role:{}", name),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrincipalKind::User => "user",
            PrincipalKind::Role => "role",
        }
    }
}

/// A precomputed effective channel set installed by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    /// The effective grants at install time.
    pub channels: TimedSet,

    /// Version of the role source the snapshot was computed against.
    ///
    /// `None` when no role source was attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_version: Option<u64>,
}

/// State shared by every principal variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalBase {
    pub(crate) name: String,

    #[serde(rename = "admin_channels", default)]
    pub(crate) explicit_channels: TimedSet,

    #[serde(rename = "all_channels", default, skip_serializing_if = "Option::is_none")]
    pub(crate) snapshot: Option<ChannelSnapshot>,
}

impl PrincipalBase {
    pub(crate) fn new(name: impl Into<String>, explicit_channels: TimedSet) -> Self {
        Self {
            name: name.into(),
            explicit_channels,
            snapshot: None,
        }
    }

    /// Replace the explicit grants after validating them.
    ///
    /// The principal is left untouched if validation fails.
    pub(crate) fn set_explicit_channels(&mut self, channels: TimedSet) -> Result<()> {
        channels.validate()?;
        self.explicit_channels = channels;
        self.snapshot = None;
        Ok(())
    }

    pub(crate) fn validate_channels(&self) -> std::result::Result<(), ValidationError> {
        self.explicit_channels.validate()
    }

    /// The snapshot merged with the explicit grants, if the snapshot was
    /// taken at `role_version`.
    pub(crate) fn snapshot_at(&self, role_version: Option<u64>) -> Option<TimedSet> {
        self.snapshot
            .as_ref()
            .filter(|snap| snap.role_version == role_version)
            .map(|snap| snap.channels.merge(&self.explicit_channels))
    }
}

/// Behavior shared by users and roles.
pub trait Principal {
    /// The principal's identifier.
    fn name(&self) -> &str;

    /// The effective grants: every channel this principal can see and the
    /// sequence at which access began.
    fn channels(&self) -> TimedSet;

    /// Grants assigned directly through the admin API.
    fn explicit_channels(&self) -> &TimedSet;

    /// Replace the explicit grants. Fails, leaving the principal unchanged,
    /// if any channel name is invalid.
    fn set_explicit_channels(&mut self, channels: TimedSet) -> Result<()>;

    /// Returns true for the anonymous guest user.
    fn is_guest(&self) -> bool {
        self.name() == GUEST_NAME
    }

    /// Returns true if `channel` is one of this principal's effective grants.
    ///
    /// The wildcard is not special here; expand it first.
    fn can_see_channel(&self, channel: &str) -> bool {
        self.channels().has_channel(channel)
    }

    /// The sequence at which access to `channel` began, or 0 if there is no
    /// access.
    fn can_see_channel_since(&self, channel: &str) -> Sequence {
        self.channels().contains(channel).unwrap_or(NO_ACCESS)
    }

    /// Fail unless every channel in `channels` is visible.
    ///
    /// The error names the lexically first forbidden channel. An empty set
    /// always passes.
    fn authorize_all_channels(&self, channels: &ChannelSet) -> Result<()> {
        if channels.is_empty() {
            return Ok(());
        }
        let visible = self.channels();
        let forbidden: Vec<String> = channels
            .iter()
            .filter(|c| !visible.has_channel(c))
            .cloned()
            .collect();

        match forbidden.first() {
            None => Ok(()),
            Some(first) => {
                tracing::debug!(
                    principal = self.name(),
                    channels = ?forbidden,
                    "channel authorization denied"
                );
                Err(AuthError::AccessDenied {
                    channel: first.clone(),
                    forbidden,
                    guest: self.is_guest(),
                })
            }
        }
    }

    /// The error to answer an unauthorized request with: `Unauthenticated`
    /// for the guest, `Forbidden` for anyone else.
    fn unauth_error(&self, message: &str) -> AuthError {
        if self.is_guest() {
            AuthError::Unauthenticated(message.to_string())
        } else {
            AuthError::Forbidden(message.to_string())
        }
    }
}

/// Hooks used by the persistence layer. Not part of the request-layer
/// contract.
pub trait PrincipalDocument: Principal {
    /// Which variant this is.
    fn kind(&self) -> PrincipalKind;

    /// Stable storage key.
    fn doc_id(&self) -> String {
        self.kind().doc_id(self.name())
    }

    /// Stable access-view index key.
    fn access_view_key(&self) -> String {
        self.kind().access_view_key(self.name())
    }

    /// Check the principal before it is persisted.
    fn validate(&self) -> std::result::Result<(), ValidationError>;

    /// Install a precomputed effective channel set.
    ///
    /// The snapshot is dropped by the next change to explicit grants or role
    /// membership, and ignored by users once their role source moves to a
    /// new version.
    fn set_channels(&mut self, channels: TimedSet);

    /// Drop any installed snapshot, returning to live computation.
    fn invalidate_channels(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_ids() {
        assert_eq!(PrincipalKind::User.doc_id("alice"), "_sync:user:alice");
        assert_eq!(PrincipalKind::Role.doc_id("ops"), "_sync:role:ops");
        assert_eq!(PrincipalKind::User.doc_id(GUEST_NAME), "_sync:user:");
    }

    #[test]
    fn test_access_view_keys() {
        assert_eq!(PrincipalKind::User.access_view_key("alice"), "alice");
        assert_eq!(PrincipalKind::Role.access_view_key("ops"), "role:ops");
    }

    #[test]
    fn test_base_rejects_invalid_channels_without_mutating() {
        let mut base = PrincipalBase::new("x", TimedSet::at_sequence(["a"], 1));
        let bad = TimedSet::at_sequence(["*"], 2);

        assert!(base.set_explicit_channels(bad).is_err());
        assert_eq!(base.explicit_channels, TimedSet::at_sequence(["a"], 1));
    }

    #[test]
    fn test_snapshot_version_match() {
        let mut base = PrincipalBase::new("x", TimedSet::at_sequence(["a"], 5));
        base.snapshot = Some(ChannelSnapshot {
            channels: TimedSet::at_sequence(["a", "b"], 3),
            role_version: Some(4),
        });

        assert_eq!(
            base.snapshot_at(Some(4)),
            Some(TimedSet::at_sequence(["a", "b"], 3))
        );
        assert_eq!(base.snapshot_at(Some(5)), None);
        assert_eq!(base.snapshot_at(None), None);
    }
}
