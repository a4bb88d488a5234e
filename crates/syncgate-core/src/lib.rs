//! # SyncGate Core
//!
//! Pure primitives for SyncGate channel access: timed channel sets and the
//! naming rules that every grant must satisfy.
//!
//! This crate contains no I/O, no storage, no logging. It is pure computation
//! over channel grants.
//!
//! ## Key Types
//!
//! - [`TimedSet`] - Channel name to the sequence at which access began
//! - [`ChannelSet`] - Plain set of channel names, as sent by clients
//! - [`ValidationError`] - Malformed names, channels, or email addresses
//!
//! ## Merge Rule
//!
//! Merging two [`TimedSet`]s keeps every channel from either side and, when a
//! channel appears in both, the earlier sequence. See [`TimedSet::merge`].

pub mod channel;
pub mod error;
pub mod timed_set;
pub mod validation;

pub use channel::{
    contains_wildcard, is_valid_channel_name, validate_channel_name, ChannelSet, WILDCARD,
};
pub use error::ValidationError;
pub use timed_set::TimedSet;
pub use validation::{
    is_valid_email, is_valid_principal_name, validate_principal_name, validate_role_name,
};

/// A sequence number assigned by the surrounding event log.
///
/// Real grants are always stamped with a sequence of at least 1; 0 means
/// "no access".
pub type Sequence = u64;

/// The sentinel sequence meaning "no access".
pub const NO_ACCESS: Sequence = 0;
