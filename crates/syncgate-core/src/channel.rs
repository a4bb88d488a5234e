//! Channel names.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

/// The request-time marker meaning "every channel this principal can see".
pub const WILDCARD: &str = "*";

/// A plain set of channel names, ordered so iteration is deterministic.
pub type ChannelSet = BTreeSet<String>;

static CHANNEL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-+=/_.@\p{L}\p{Nd}]+$").expect("channel name pattern"));

/// Check a channel name against the grant rules.
///
/// A grantable channel is non-empty, is not the wildcard, and uses only
/// letters, digits and `- + = / _ . @`.
pub fn validate_channel_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyChannel);
    }
    if name == WILDCARD {
        return Err(ValidationError::WildcardChannel);
    }
    if !CHANNEL_NAME.is_match(name) {
        return Err(ValidationError::InvalidChannel(name.to_string()));
    }
    Ok(())
}

/// Returns true if `name` could be stored as a channel grant.
pub fn is_valid_channel_name(name: &str) -> bool {
    validate_channel_name(name).is_ok()
}

/// Returns true if the request set contains the wildcard marker.
pub fn contains_wildcard(channels: &ChannelSet) -> bool {
    channels.contains(WILDCARD)
}
