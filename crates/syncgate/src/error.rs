//! Error types for the gateway.

use syncgate_auth::{AuthError, PrincipalKind, StatusClass};
use syncgate_core::ValidationError;
use syncgate_store::StoreError;
use thiserror::Error;

/// Errors that can occur during gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Authorization error.
    #[error("authorization error: {0}")]
    Auth(#[from] AuthError),

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// User not found.
    #[error("user not found: {0:?}")]
    UserNotFound(String),

    /// Role not found.
    #[error("role not found: {0:?}")]
    RoleNotFound(String),

    /// A principal with this name already exists.
    #[error("{} already exists: {name:?}", .kind.as_str())]
    PrincipalExists { kind: PrincipalKind, name: String },
}

impl GatewayError {
    /// The not-found error for a principal kind.
    pub fn not_found(kind: PrincipalKind, name: &str) -> Self {
        match kind {
            PrincipalKind::User => GatewayError::UserNotFound(name.to_string()),
            PrincipalKind::Role => GatewayError::RoleNotFound(name.to_string()),
        }
    }

    /// The response class for request-level failures. `None` for errors the
    /// caller did not cause.
    pub fn status_class(&self) -> Option<StatusClass> {
        match self {
            GatewayError::Auth(e) => Some(e.status_class()),
            GatewayError::Validation(_) => Some(StatusClass::BadRequest),
            _ => None,
        }
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
