//! # SyncGate Auth
//!
//! Principals and channel authorization.
//!
//! ## Overview
//!
//! A principal is an identity that holds channel grants. There are two
//! kinds:
//!
//! - **Role**: a named bundle of grants
//! - **User**: a principal that can log in, and that inherits the grants of
//!   every role it names
//!
//! Each grant is stamped with the sequence at which access began. A user's
//! effective grants are its explicit grants merged with its roles' grants,
//! keeping the earliest sequence per channel.
//!
//! ## Authorization
//!
//! - [`Principal::can_see_channel`] checks one channel
//! - [`Principal::authorize_all_channels`] checks a whole request
//! - [`User::expand_wildcard_channel`] turns a `"*"` request into concrete
//!   channel names before authorization
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use syncgate_auth::{Principal, Role, RoleSnapshot, User};
//! use syncgate_core::TimedSet;
//!
//! let editors = Role::new("editors", TimedSet::at_sequence(["drafts"], 7)).unwrap();
//!
//! let mut alice = User::new("alice", "s3cret", TimedSet::at_sequence(["news"], 3)).unwrap();
//! alice.set_explicit_role_names(["editors"]).unwrap();
//! let alice = alice.with_roles(Arc::new(RoleSnapshot::from_roles([editors], 1)));
//!
//! assert!(alice.authenticate("s3cret"));
//! assert_eq!(alice.can_see_channel_since("drafts"), 7);
//! ```

pub mod credential;
pub mod error;
pub mod lookup;
pub mod principal;
pub mod role;
pub mod user;

pub use credential::Credential;
pub use error::{AuthError, Result, StatusClass};
pub use lookup::{RoleLookup, RoleSnapshot};
pub use principal::{
    ChannelSnapshot, Principal, PrincipalBase, PrincipalDocument, PrincipalKind, GUEST_NAME,
};
pub use role::Role;
pub use user::User;
