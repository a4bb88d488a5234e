//! End-to-end channel access through the Authenticator.
//!
//! Every scenario runs against both the in-memory and the SQLite store.

use std::collections::BTreeSet;

use syncgate::store::{MemoryStore, PrincipalStore, SqliteStore};
use syncgate::{
    AuthError, Authenticator, AuthenticatorConfig, ChannelSet, GatewayError, Principal,
    PrincipalKind, StatusClass, TimedSet, GUEST_NAME,
};

fn set(names: &[&str]) -> ChannelSet {
    names.iter().map(|s| s.to_string()).collect()
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn memory() -> Authenticator<MemoryStore> {
    init_tracing();
    Authenticator::new(MemoryStore::new(), AuthenticatorConfig::default())
}

fn sqlite() -> Authenticator<SqliteStore> {
    init_tracing();
    Authenticator::new(
        SqliteStore::open_memory().unwrap(),
        AuthenticatorConfig::default(),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────────────

async fn wildcard_request<S: PrincipalStore>(auth: Authenticator<S>) {
    auth.create_user("alice", "pw", &set(&["a"])).await.unwrap(); // seq 1
    auth.create_role("r", &set(&["b"])).await.unwrap(); // seq 2
    auth.grant_roles("alice", &names(&["r"])).await.unwrap();

    let alice = auth.get_user("alice").await.unwrap().unwrap();
    let granted = auth.authorize_request(&alice, &set(&["*"])).unwrap();

    assert_eq!(granted, TimedSet::from_iter([("a", 1), ("b", 2)]));
}

async fn earliest_grant_wins<S: PrincipalStore>(auth: Authenticator<S>) {
    auth.create_role("early", &set(&["shared"])).await.unwrap(); // seq 1
    auth.create_user("bob", "pw", &set(&["shared", "own"])).await.unwrap(); // seq 2
    auth.grant_roles("bob", &names(&["early"])).await.unwrap();

    let bob = auth.get_user("bob").await.unwrap().unwrap();
    assert_eq!(bob.can_see_channel_since("shared"), 1);
    assert_eq!(bob.can_see_channel_since("own"), 2);
    assert_eq!(bob.can_see_channel_since("other"), 0);
}

async fn deleted_role_grants_nothing<S: PrincipalStore>(auth: Authenticator<S>) {
    auth.create_role("r", &set(&["b"])).await.unwrap();
    auth.create_user("alice", "pw", &set(&["a"])).await.unwrap();
    auth.grant_roles("alice", &names(&["r"])).await.unwrap();

    assert!(auth.delete_role("r").await.unwrap());
    assert!(!auth.delete_role("r").await.unwrap());

    let alice = auth.get_user("alice").await.unwrap().unwrap();
    assert_eq!(alice.role_names(), ["r".to_string()]);
    assert!(alice.can_see_channel("a"));
    assert!(!alice.can_see_channel("b"));
    assert_eq!(
        auth.authorize_request(&alice, &set(&["*"])).unwrap().as_set(),
        set(&["a"])
    );
}

async fn denial_classes<S: PrincipalStore>(auth: Authenticator<S>) {
    auth.create_user("alice", "pw", &set(&["a"])).await.unwrap();
    let alice = auth.get_user("alice").await.unwrap().unwrap();

    let err = auth
        .authorize_request(&alice, &set(&["a", "z", "m"]))
        .unwrap_err();
    match &err {
        GatewayError::Auth(AuthError::AccessDenied {
            channel,
            forbidden,
            guest,
        }) => {
            assert_eq!(channel, "m");
            assert_eq!(forbidden, &names(&["m", "z"]));
            assert!(!guest);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.status_class(), Some(StatusClass::Forbidden));

    let mut guest = auth.get_user(GUEST_NAME).await.unwrap().unwrap();
    guest.set_disabled(false);
    let err = auth.authorize_request(&guest, &set(&["a"])).unwrap_err();
    assert_eq!(err.status_class(), Some(StatusClass::Unauthorized));
}

async fn disabled_user<S: PrincipalStore>(auth: Authenticator<S>) {
    auth.create_user("carol", "pw", &set(&["a"])).await.unwrap();
    assert!(auth.authenticate_user("carol", "pw").await.unwrap().is_some());
    assert!(auth.authenticate_user("carol", "nope").await.unwrap().is_none());
    assert!(auth.authenticate_user("nobody", "pw").await.unwrap().is_none());

    let mut carol = auth.get_user("carol").await.unwrap().unwrap();
    carol.set_disabled(true);
    auth.save_user(&carol).await.unwrap();

    assert!(auth.authenticate_user("carol", "pw").await.unwrap().is_none());
    let err = auth.authorize_request(&carol, &set(&["a"])).unwrap_err();
    assert!(matches!(err, GatewayError::Auth(AuthError::Forbidden(_))));
}

async fn regrant_keeps_earlier_sequence<S: PrincipalStore>(auth: Authenticator<S>) {
    auth.create_user("dave", "pw", &set(&["a"])).await.unwrap(); // seq 1
    let explicit = auth
        .grant_channels(PrincipalKind::User, "dave", &set(&["a", "b"]))
        .await
        .unwrap(); // seq 2
    assert_eq!(explicit, TimedSet::from_iter([("a", 1), ("b", 2)]));

    let explicit = auth
        .revoke_channels(PrincipalKind::User, "dave", &set(&["a"]))
        .await
        .unwrap();
    assert_eq!(explicit, TimedSet::from_iter([("b", 2)]));

    let dave = auth.get_user("dave").await.unwrap().unwrap();
    assert_eq!(dave.explicit_channels(), &explicit);
}

async fn stale_snapshot_ignored<S: PrincipalStore>(auth: Authenticator<S>) {
    auth.create_role("r", &set(&["b"])).await.unwrap();
    auth.create_user("erin", "pw", &set(&["a"])).await.unwrap();
    auth.grant_roles("erin", &names(&["r"])).await.unwrap();
    auth.store()
        .record_access("erin", &TimedSet::from_iter([("dynamic", 9)]))
        .await
        .unwrap();

    let mut erin = auth.get_user("erin").await.unwrap().unwrap();
    auth.rebuild_user_channels(&mut erin).await.unwrap();
    auth.save_user(&erin).await.unwrap();

    // Snapshot still current: access-view grants are visible.
    let erin = auth.get_user("erin").await.unwrap().unwrap();
    assert!(erin.can_see_channel("dynamic"));
    assert!(erin.can_see_channel("b"));

    // Any role change moves the role version past the snapshot.
    auth.grant_channels(PrincipalKind::Role, "r", &set(&["c"]))
        .await
        .unwrap();
    let erin = auth.get_user("erin").await.unwrap().unwrap();
    assert!(!erin.can_see_channel("dynamic"));
    assert!(erin.can_see_channel("c"));

    // Explicitly dropping it has the same effect.
    let mut erin = auth.get_user("erin").await.unwrap().unwrap();
    auth.rebuild_user_channels(&mut erin).await.unwrap();
    auth.save_user(&erin).await.unwrap();
    auth.invalidate_channels(PrincipalKind::User, "erin")
        .await
        .unwrap();
    let erin = auth.get_user("erin").await.unwrap().unwrap();
    assert!(!erin.can_see_channel("dynamic"));
}

async fn admin_errors<S: PrincipalStore>(auth: Authenticator<S>) {
    auth.create_user("frank", "pw", &ChannelSet::new()).await.unwrap();
    let err = auth
        .create_user("frank", "pw", &ChannelSet::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GatewayError::PrincipalExists {
            kind: PrincipalKind::User,
            ..
        }
    ));

    let err = auth
        .grant_channels(PrincipalKind::Role, "missing", &set(&["a"]))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::RoleNotFound(_)));

    let err = auth
        .grant_channels(PrincipalKind::User, "frank", &set(&["*"]))
        .await
        .unwrap_err();
    assert_eq!(err.status_class(), Some(StatusClass::BadRequest));
    let frank = auth.get_user("frank").await.unwrap().unwrap();
    assert!(frank.explicit_channels().is_empty());

    assert!(auth.create_role("", &set(&["a"])).await.is_err());
    assert!(auth.grant_roles("frank", &names(&["bad name"])).await.is_err());
}

async fn role_membership<S: PrincipalStore>(auth: Authenticator<S>) {
    auth.create_role("r1", &set(&["one"])).await.unwrap();
    auth.create_role("r2", &set(&["two"])).await.unwrap();
    auth.create_user("gina", "pw", &ChannelSet::new()).await.unwrap();

    auth.grant_roles("gina", &names(&["r2", "r1", "r2"]))
        .await
        .unwrap();
    let gina = auth.get_user("gina").await.unwrap().unwrap();
    assert_eq!(gina.role_names(), names(&["r1", "r2"]).as_slice());
    assert_eq!(gina.channels().as_set(), set(&["one", "two"]));

    auth.revoke_roles("gina", &names(&["r1"])).await.unwrap();
    let gina = auth.get_user("gina").await.unwrap().unwrap();
    assert_eq!(gina.channels().as_set(), set(&["two"]));

    let mut users = auth.store().list_users().await.unwrap();
    users.sort();
    assert_eq!(users, names(&["gina"]));
}

macro_rules! both_stores {
    ($($name:ident),* $(,)?) => {
        mod memory_store {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::memory()).await;
                }
            )*
        }

        mod sqlite_store {
            $(
                #[tokio::test]
                async fn $name() {
                    super::$name(super::sqlite()).await;
                }
            )*
        }
    };
}

both_stores!(
    wildcard_request,
    earliest_grant_wins,
    deleted_role_grants_nothing,
    denial_classes,
    disabled_user,
    regrant_keeps_earlier_sequence,
    stale_snapshot_ignored,
    admin_errors,
    role_membership,
);

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_guest_disabled_by_default() {
    let auth = memory();
    assert!(auth.guest().await.unwrap().is_none());

    let guest = auth.get_user(GUEST_NAME).await.unwrap().unwrap();
    assert!(guest.is_guest());
    let err = auth.authorize_request(&guest, &set(&["a"])).unwrap_err();
    assert!(matches!(err, GatewayError::Auth(AuthError::Unauthenticated(_))));
    assert_eq!(err.status_class(), Some(StatusClass::Unauthorized));
}

#[tokio::test]
async fn test_guest_enabled() {
    let config = AuthenticatorConfig {
        guest_enabled: true,
        guest_channels: set(&["public"]),
        ..AuthenticatorConfig::default()
    };
    let auth = Authenticator::new(MemoryStore::new(), config);

    let guest = auth.guest().await.unwrap().unwrap();
    assert_eq!(guest.can_see_channel_since("public"), 1);
    assert_eq!(
        auth.authorize_request(&guest, &set(&["*"])).unwrap(),
        TimedSet::from_iter([("public", 1)])
    );
    assert_eq!(
        auth.authorize_channel(&guest, "private")
            .unwrap_err()
            .status_class(),
        Some(StatusClass::Unauthorized)
    );
}

#[tokio::test]
async fn test_stored_guest_overrides_default() {
    let auth = memory();
    auth.create_user(GUEST_NAME, "", &set(&["lobby"])).await.unwrap();

    let guest = auth.guest().await.unwrap().unwrap();
    assert!(guest.can_see_channel("lobby"));
    assert!(auth.authenticate_user(GUEST_NAME, "").await.unwrap().is_none());
}

#[tokio::test]
async fn test_rebuild_on_load() {
    let config = AuthenticatorConfig {
        rebuild_on_load: true,
        ..AuthenticatorConfig::default()
    };
    let auth = Authenticator::new(MemoryStore::new(), config);
    auth.create_role("r", &set(&["b"])).await.unwrap();
    auth.create_user("hal", "pw", &set(&["a"])).await.unwrap();
    auth.store()
        .record_access("hal", &TimedSet::from_iter([("dyn", 5)]))
        .await
        .unwrap();
    auth.store()
        .record_access("role:r", &TimedSet::from_iter([("role-dyn", 6)]))
        .await
        .unwrap();

    let hal = auth.get_user("hal").await.unwrap().unwrap();
    assert!(hal.can_see_channel("dyn"));
    assert!(hal.can_see_channel("a"));

    let r = auth.get_role("r").await.unwrap().unwrap();
    assert_eq!(r.channels().as_set(), set(&["b", "role-dyn"]));
}

#[tokio::test]
async fn test_sqlite_reopen_keeps_access() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gate.db");

    {
        let auth = Authenticator::new(
            SqliteStore::open(&path).unwrap(),
            AuthenticatorConfig::default(),
        );
        auth.create_role("r", &set(&["b"])).await.unwrap();
        auth.create_user("ivy", "pw", &set(&["a"])).await.unwrap();
        auth.grant_roles("ivy", &names(&["r"])).await.unwrap();
    }

    let auth = Authenticator::new(
        SqliteStore::open(&path).unwrap(),
        AuthenticatorConfig::default(),
    );
    let ivy = auth.authenticate_user("ivy", "pw").await.unwrap().unwrap();
    assert_eq!(
        auth.authorize_request(&ivy, &set(&["*"])).unwrap(),
        TimedSet::from_iter([("a", 2), ("b", 1)])
    );

    // Sequences continue after reopen.
    let explicit = auth
        .grant_channels(PrincipalKind::User, "ivy", &set(&["c"]))
        .await
        .unwrap();
    assert_eq!(explicit.contains("c"), Some(3));
}

#[tokio::test]
async fn test_empty_request_always_authorized() {
    let auth = memory();
    auth.create_user("jo", "pw", &ChannelSet::new()).await.unwrap();
    let jo = auth.get_user("jo").await.unwrap().unwrap();

    assert!(auth
        .authorize_request(&jo, &BTreeSet::new())
        .unwrap()
        .is_empty());
    assert!(auth.authorize_request(&jo, &set(&["*"])).unwrap().is_empty());
}
