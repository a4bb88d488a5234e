//! Error types for the auth module.

use syncgate_core::ValidationError;
use thiserror::Error;

/// How the request layer should answer an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// The caller has not logged in (401).
    Unauthorized,
    /// The caller is known but lacks access (403).
    Forbidden,
    /// The request itself was malformed (400).
    BadRequest,
}

impl StatusClass {
    /// The HTTP status code for this class.
    pub const fn code(self) -> u16 {
        match self {
            StatusClass::Unauthorized => 401,
            StatusClass::Forbidden => 403,
            StatusClass::BadRequest => 400,
        }
    }
}

/// Errors that can occur during authorization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The principal cannot see one or more requested channels.
    #[error("access denied to channel {channel:?}")]
    AccessDenied {
        /// The first forbidden channel in lexical order.
        channel: String,
        /// Every forbidden channel, in lexical order.
        forbidden: Vec<String>,
        /// Whether the principal was the guest user.
        guest: bool,
    },

    /// The guest user hit a protected resource.
    #[error("login required: {0}")]
    Unauthenticated(String),

    /// A named principal hit a resource it may not see.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Invalid principal data.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl AuthError {
    /// Classify this error for the response layer.
    pub fn status_class(&self) -> StatusClass {
        match self {
            AuthError::AccessDenied { guest: true, .. } | AuthError::Unauthenticated(_) => {
                StatusClass::Unauthorized
            }
            AuthError::AccessDenied { guest: false, .. } | AuthError::Forbidden(_) => {
                StatusClass::Forbidden
            }
            AuthError::Validation(_) => StatusClass::BadRequest,
        }
    }
}

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
