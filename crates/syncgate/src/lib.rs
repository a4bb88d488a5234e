//! # SyncGate
//!
//! The unified API for channel access control: users, roles, and the
//! channels each may read.
//!
//! ## Overview
//!
//! SyncGate decides which channels a principal may replicate:
//!
//! - **Channels**: Named partitions of a document database
//! - **Roles**: Named bundles of channel grants
//! - **Users**: Principals that log in and inherit the grants of their roles
//! - **Grants**: Channel names stamped with the sequence at which access began
//!
//! ## Key Concepts
//!
//! - **Effective channels**: A user's own grants merged with its roles'
//!   grants. When a channel comes from several sources the earliest
//!   sequence wins.
//! - **Wildcard**: A request for `"*"` means "every channel I can see". It
//!   is never stored as a grant.
//! - **Guest**: The anonymous user with the empty name. Denials for the
//!   guest ask for credentials (401) rather than forbid (403).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::collections::BTreeSet;
//! use syncgate::{Authenticator, AuthenticatorConfig, PrincipalKind};
//! use syncgate::store::MemoryStore;
//!
//! async fn example() {
//!     let auth = Authenticator::new(MemoryStore::new(), AuthenticatorConfig::default());
//!
//!     let news: BTreeSet<String> = ["news".to_string()].into();
//!     auth.create_role("readers", &news).await.unwrap();
//!     auth.create_user("alice", "s3cret", &BTreeSet::new()).await.unwrap();
//!     auth.grant_roles("alice", &["readers".to_string()]).await.unwrap();
//!
//!     let alice = auth.authenticate_user("alice", "s3cret").await.unwrap().unwrap();
//!     let wildcard: BTreeSet<String> = ["*".to_string()].into();
//!     let granted = auth.authorize_request(&alice, &wildcard).unwrap();
//!     assert!(granted.has_channel("news"));
//!
//!     auth.revoke_channels(PrincipalKind::Role, "readers", &news).await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `syncgate::core` - Channel names, sequences and timed sets
//! - `syncgate::auth` - Principals, credentials and authorization checks
//! - `syncgate::store` - Storage abstraction, in-memory and SQLite stores

pub mod authenticator;
pub mod error;

// Re-export component crates
pub use syncgate_auth as auth;
pub use syncgate_core as core;
pub use syncgate_store as store;

// Re-export main types for convenience
pub use authenticator::{Authenticator, AuthenticatorConfig};
pub use error::{GatewayError, Result};

// Re-export commonly used types
pub use syncgate_auth::{
    AuthError, Principal, PrincipalDocument, PrincipalKind, Role, RoleLookup, StatusClass, User,
    GUEST_NAME,
};
pub use syncgate_core::{ChannelSet, Sequence, TimedSet, WILDCARD};
