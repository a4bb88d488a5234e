//! Proptest generators for property-based testing.

use std::sync::Arc;

use proptest::prelude::*;

use syncgate_auth::{Role, RoleSnapshot, User};
use syncgate_core::{ChannelSet, Sequence, TimedSet};

/// Generate a valid channel name.
pub fn channel_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.-]{0,11}".prop_map(String::from)
}

/// Generate a grant sequence (never 0).
pub fn sequence() -> impl Strategy<Value = Sequence> {
    1u64..=1_000_000u64
}

/// Generate a set of channel names.
pub fn channel_set(max_len: usize) -> impl Strategy<Value = ChannelSet> {
    prop::collection::btree_set(channel_name(), 0..=max_len)
}

/// Generate a timed set with up to `max_len` grants.
pub fn timed_set(max_len: usize) -> impl Strategy<Value = TimedSet> {
    prop::collection::btree_map(channel_name(), sequence(), 0..=max_len)
        .prop_map(TimedSet::from_iter)
}

/// Generate a valid role name.
pub fn role_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}".prop_map(String::from)
}

/// Parameters for generating a user and the roles it can see.
#[derive(Debug, Clone)]
pub struct UserParams {
    pub explicit: TimedSet,
    /// Roles that exist, by name.
    pub roles: Vec<(String, TimedSet)>,
    /// Role names the user belongs to. May name roles that do not exist.
    pub role_names: Vec<String>,
}

impl Arbitrary for UserParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            timed_set(8),
            prop::collection::btree_map(role_name(), timed_set(6), 0..=4),
            prop::collection::vec(role_name(), 0..=4),
        )
            .prop_map(|(explicit, roles, extra)| {
                let mut role_names: Vec<String> = roles.keys().cloned().collect();
                role_names.extend(extra);
                UserParams {
                    explicit,
                    roles: roles.into_iter().collect(),
                    role_names,
                }
            })
            .boxed()
    }
}

/// Build a user from parameters, with a snapshot of its roles attached.
pub fn user_from_params(params: &UserParams) -> User {
    let roles = params
        .roles
        .iter()
        .map(|(name, channels)| Role::new(name.as_str(), channels.clone()))
        .collect::<Result<Vec<_>, _>>()
        .expect("generated role is valid");

    let mut user =
        User::new("user", "", params.explicit.clone()).expect("generated user is valid");
    user.set_explicit_role_names(params.role_names.iter().cloned())
        .expect("generated role names are valid");
    user.with_roles(Arc::new(RoleSnapshot::from_roles(roles, 1)))
}
