//! Principal name and email address rules.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

static PRINCIPAL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+.@%\w]*$").expect("principal name pattern"));

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s<>\[\]]+@[^@\s.<>\[\]]+(\.[^@\s.<>\[\]]+)+$").expect("email pattern")
});

/// Returns true if `name` uses only the principal alphabet.
///
/// The empty string passes: it is the guest user's name. Callers that need a
/// non-empty name (roles, role references) check that separately.
pub fn is_valid_principal_name(name: &str) -> bool {
    PRINCIPAL_NAME.is_match(name)
}

/// Validate a principal name, returning a [`ValidationError`] on failure.
pub fn validate_principal_name(name: &str) -> Result<(), ValidationError> {
    if is_valid_principal_name(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName(name.to_string()))
    }
}

/// Validate a name used to reference a role.
pub fn validate_role_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || !is_valid_principal_name(name) {
        return Err(ValidationError::InvalidRoleName(name.to_string()));
    }
    Ok(())
}

/// Returns true if `email` is a syntactically valid address.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}
