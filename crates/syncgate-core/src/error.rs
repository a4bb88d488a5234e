//! Error types for SyncGate Core.

use thiserror::Error;

/// Validation errors raised when a principal or grant is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid principal name: {0:?}")]
    InvalidName(String),

    #[error("principal name must not be empty")]
    EmptyName,

    #[error("channel name must not be empty")]
    EmptyChannel,

    #[error("the wildcard channel \"*\" cannot be granted as a literal channel")]
    WildcardChannel,

    #[error("invalid channel name: {0:?}")]
    InvalidChannel(String),

    #[error("channel {0:?} has sequence 0")]
    ZeroSequence(String),

    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("invalid role name: {0:?}")]
    InvalidRoleName(String),
}
