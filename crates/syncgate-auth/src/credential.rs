//! Salted password credentials.
//!
//! Passwords are never stored. A [`Credential`] holds a random salt and a
//! Blake3 key derived from the salt and the password under a fixed context
//! string. Verification re-derives the key and compares in constant time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Domain separation context for password key derivation.
const KDF_CONTEXT: &str = "syncgate 2024-01-15 user password credential v1";

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

/// A salted password hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Hex-encoded random salt.
    salt: String,
    /// Hex-encoded derived key.
    hash: String,
}

impl Credential {
    /// Hash a password with a fresh random salt.
    pub fn hash(password: &str) -> Self {
        Self::with_salt(password, rand::random::<[u8; SALT_LEN]>())
    }

    /// Hash a password with a caller-supplied salt.
    pub fn with_salt(password: &str, salt: [u8; SALT_LEN]) -> Self {
        Self {
            salt: hex::encode(salt),
            hash: derive(password, &salt).to_hex().to_string(),
        }
    }

    /// Check a password against this credential.
    ///
    /// Returns false for a credential whose stored fields are not valid hex.
    pub fn verify(&self, password: &str) -> bool {
        let Ok(salt) = hex::decode(&self.salt) else {
            return false;
        };
        let Ok(expected) = blake3::Hash::from_hex(&self.hash) else {
            return false;
        };
        // blake3::Hash equality is constant-time.
        derive(password, &salt) == expected
    }
}

fn derive(password: &str, salt: &[u8]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(KDF_CONTEXT);
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize()
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}
