//! Access vectors: stored documents paired with the answer a request must
//! get.
//!
//! Each vector gives a user document and role documents in their persisted
//! JSON form, a requested channel set, and the expected outcome. They pin
//! down the merge rule, wildcard expansion, snapshot handling and the
//! guest/named error split.

use std::sync::Arc;

use syncgate::store::MemoryStore;
use syncgate::{
    Authenticator, AuthenticatorConfig, GatewayError, Sequence, StatusClass, TimedSet,
};
use syncgate_auth::{AuthError, Role, RoleSnapshot, User};
use syncgate_core::ChannelSet;

/// Role version the vectors' role snapshots are taken at.
pub const VECTOR_ROLE_VERSION: u64 = 1;

/// What a request must produce.
#[derive(Debug, Clone)]
pub enum Expected {
    /// Authorized, with exactly these grants.
    Granted(&'static [(&'static str, Sequence)]),
    /// Rejected with this status. `channel` is the reported channel, if the
    /// rejection names one.
    Denied {
        channel: Option<&'static str>,
        status: StatusClass,
    },
}

/// An access test vector.
#[derive(Debug, Clone)]
pub struct AccessVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// The stored user document.
    pub user: &'static str,
    /// Stored role documents.
    pub roles: &'static [&'static str],
    /// Requested channel names.
    pub request: &'static [&'static str],
    pub expected: Expected,
}

/// Get all access vectors.
pub fn all_vectors() -> Vec<AccessVector> {
    vec![
        AccessVector {
            name: "explicit grant only",
            user: r#"{"name":"alice","admin_channels":{"a":3}}"#,
            roles: &[],
            request: &["a"],
            expected: Expected::Granted(&[("a", 3)]),
        },
        AccessVector {
            name: "role grant wins with earlier sequence",
            user: r#"{"name":"alice","admin_channels":{"a":3},"admin_roles":["r"]}"#,
            roles: &[r#"{"name":"r","admin_channels":{"b":7,"a":1}}"#],
            request: &["*"],
            expected: Expected::Granted(&[("a", 1), ("b", 7)]),
        },
        AccessVector {
            name: "explicit grant wins with earlier sequence",
            user: r#"{"name":"alice","admin_channels":{"a":1},"admin_roles":["r"]}"#,
            roles: &[r#"{"name":"r","admin_channels":{"a":5}}"#],
            request: &["a"],
            expected: Expected::Granted(&[("a", 1)]),
        },
        AccessVector {
            name: "missing role contributes nothing",
            user: r#"{"name":"alice","admin_channels":{"a":3},"admin_roles":["gone"]}"#,
            roles: &[],
            request: &["*"],
            expected: Expected::Granted(&[("a", 3)]),
        },
        AccessVector {
            name: "wildcard with nothing visible",
            user: r#"{"name":"alice"}"#,
            roles: &[],
            request: &["*"],
            expected: Expected::Granted(&[]),
        },
        AccessVector {
            name: "zero sequence grants nothing",
            user: r#"{"name":"alice","admin_channels":{"a":0,"b":2}}"#,
            roles: &[r#"{"name":"r","admin_channels":{"c":0}}"#],
            request: &["a"],
            expected: Expected::Denied {
                channel: Some("a"),
                status: StatusClass::Forbidden,
            },
        },
        AccessVector {
            name: "zero sequence omitted from wildcard",
            user: r#"{"name":"alice","admin_channels":{"a":0,"b":2},"admin_roles":["r"]}"#,
            roles: &[r#"{"name":"r","admin_channels":{"c":0}}"#],
            request: &["*"],
            expected: Expected::Granted(&[("b", 2)]),
        },
        AccessVector {
            name: "named user denied reports first channel",
            user: r#"{"name":"alice","admin_channels":{"a":3}}"#,
            roles: &[],
            request: &["a", "z", "m"],
            expected: Expected::Denied {
                channel: Some("m"),
                status: StatusClass::Forbidden,
            },
        },
        AccessVector {
            name: "guest denied asks for login",
            user: r#"{"name":"","admin_channels":{"public":1}}"#,
            roles: &[],
            request: &["private"],
            expected: Expected::Denied {
                channel: Some("private"),
                status: StatusClass::Unauthorized,
            },
        },
        AccessVector {
            name: "disabled user",
            user: r#"{"name":"bob","disabled":true,"admin_channels":{"a":1}}"#,
            roles: &[],
            request: &["a"],
            expected: Expected::Denied {
                channel: None,
                status: StatusClass::Forbidden,
            },
        },
        AccessVector {
            name: "current snapshot is used",
            user: r#"{"name":"carl","admin_channels":{"a":2},"all_channels":{"channels":{"a":2,"x":5},"role_version":1}}"#,
            roles: &[],
            request: &["a", "x"],
            expected: Expected::Granted(&[("a", 2), ("x", 5)]),
        },
        AccessVector {
            name: "stale snapshot is ignored",
            user: r#"{"name":"carl","admin_channels":{"a":2},"all_channels":{"channels":{"a":2,"x":5},"role_version":0}}"#,
            roles: &[],
            request: &["a", "x"],
            expected: Expected::Denied {
                channel: Some("x"),
                status: StatusClass::Forbidden,
            },
        },
    ]
}

/// Load a vector's user with its roles attached.
pub fn user_from_vector(vector: &AccessVector) -> Result<User, String> {
    let user: User = serde_json::from_str(vector.user)
        .map_err(|e| format!("{}: bad user document: {e}", vector.name))?;
    let roles = vector
        .roles
        .iter()
        .map(|doc| serde_json::from_str::<Role>(doc))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("{}: bad role document: {e}", vector.name))?;

    Ok(user.with_roles(Arc::new(RoleSnapshot::from_roles(
        roles,
        VECTOR_ROLE_VERSION,
    ))))
}

/// Run a vector through [`Authenticator::authorize_request`] and compare
/// against its expected outcome.
pub fn verify_vector(vector: &AccessVector) -> Result<(), String> {
    let user = user_from_vector(vector)?;
    let auth = Authenticator::new(MemoryStore::new(), AuthenticatorConfig::default());
    let request: ChannelSet = vector.request.iter().map(|s| s.to_string()).collect();

    match (&vector.expected, auth.authorize_request(&user, &request)) {
        (Expected::Granted(grants), Ok(actual)) => {
            let expected: TimedSet = grants.iter().copied().collect();
            if actual == expected {
                Ok(())
            } else {
                Err(format!("{}: granted {actual:?}, want {expected:?}", vector.name))
            }
        }
        (Expected::Denied { channel, status }, Err(err)) => {
            let reported = match &err {
                GatewayError::Auth(AuthError::AccessDenied { channel, .. }) => {
                    Some(channel.as_str())
                }
                _ => None,
            };
            if reported != *channel {
                return Err(format!(
                    "{}: denied channel {reported:?}, want {channel:?}",
                    vector.name
                ));
            }
            if err.status_class() != Some(*status) {
                return Err(format!(
                    "{}: status {:?}, want {status:?}",
                    vector.name,
                    err.status_class()
                ));
            }
            Ok(())
        }
        (_, Ok(actual)) => Err(format!("{}: unexpectedly granted {actual:?}", vector.name)),
        (_, Err(err)) => Err(format!("{}: unexpectedly denied: {err}", vector.name)),
    }
}

/// Verify every vector. Returns `(name, error)` for each failure.
pub fn verify_all_vectors() -> Vec<(&'static str, String)> {
    all_vectors()
        .iter()
        .filter_map(|v| verify_vector(v).err().map(|e| (v.name, e)))
        .collect()
}
