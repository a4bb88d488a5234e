//! Roles: named bundles of channel grants that users can reference.

use serde::{Deserialize, Serialize};
use syncgate_core::{validate_principal_name, TimedSet, ValidationError};

use crate::error::Result;
use crate::principal::{
    ChannelSnapshot, Principal, PrincipalBase, PrincipalDocument, PrincipalKind,
};

/// A principal with no capabilities beyond its grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(flatten)]
    base: PrincipalBase,
}

impl Role {
    /// Create a role, validating its name and grants.
    pub fn new(name: impl Into<String>, channels: TimedSet) -> Result<Self> {
        let role = Self {
            base: PrincipalBase::new(name, channels),
        };
        role.validate()?;
        Ok(role)
    }
}

impl Principal for Role {
    fn name(&self) -> &str {
        &self.base.name
    }

    /// The explicit grants, merged with any installed snapshot.
    fn channels(&self) -> TimedSet {
        match &self.base.snapshot {
            Some(snap) => snap.channels.merge(&self.base.explicit_channels),
            None => self.base.explicit_channels.clone(),
        }
    }

    fn explicit_channels(&self) -> &TimedSet {
        &self.base.explicit_channels
    }

    fn set_explicit_channels(&mut self, channels: TimedSet) -> Result<()> {
        self.base.set_explicit_channels(channels)
    }
}

impl PrincipalDocument for Role {
    fn kind(&self) -> PrincipalKind {
        PrincipalKind::Role
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.base.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        validate_principal_name(&self.base.name)?;
        self.base.validate_channels()
    }

    fn set_channels(&mut self, channels: TimedSet) {
        self.base.snapshot = Some(ChannelSnapshot {
            channels,
            role_version: None,
        });
    }

    fn invalidate_channels(&mut self) {
        self.base.snapshot = None;
    }
}
