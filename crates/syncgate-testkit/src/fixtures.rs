//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use syncgate::store::MemoryStore;
use syncgate::{Authenticator, AuthenticatorConfig, ChannelSet, Result, Role, User};

/// Password given to every fixture user.
pub const DEFAULT_PASSWORD: &str = "letmein";

/// Build a channel set from names.
pub fn channels(names: &[&str]) -> ChannelSet {
    names.iter().map(|s| s.to_string()).collect()
}

/// A test fixture with an authenticator over a memory store.
pub struct TestFixture {
    pub auth: Authenticator<MemoryStore>,
}

impl TestFixture {
    /// Create a fixture with the default configuration.
    pub fn new() -> Self {
        Self::with_config(AuthenticatorConfig::default())
    }

    /// Create a fixture with a custom configuration.
    pub fn with_config(config: AuthenticatorConfig) -> Self {
        Self {
            auth: Authenticator::new(MemoryStore::new(), config),
        }
    }

    /// Create and save a role granting `names`.
    pub async fn role(&self, name: &str, names: &[&str]) -> Result<Role> {
        self.auth.create_role(name, &channels(names)).await
    }

    /// Create and save a user with [`DEFAULT_PASSWORD`], then return it
    /// loaded with its roles resolved.
    pub async fn user(&self, name: &str, names: &[&str], roles: &[&str]) -> Result<User> {
        self.auth
            .create_user(name, DEFAULT_PASSWORD, &channels(names))
            .await?;
        if !roles.is_empty() {
            let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
            self.auth.grant_roles(name, &roles).await?;
        }
        self.reload(name).await
    }

    /// Load a saved user with its roles resolved.
    pub async fn reload(&self, name: &str) -> Result<User> {
        self.auth
            .get_user(name)
            .await?
            .ok_or_else(|| syncgate::GatewayError::UserNotFound(name.to_string()))
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syncgate::{Principal, PrincipalKind};

    #[tokio::test]
    async fn test_fixture_user_with_roles() {
        let fixture = TestFixture::new();
        fixture.role("staff", &["memos"]).await.unwrap();
        let user = fixture
            .user("pat", &["inbox"], &["staff"])
            .await
            .unwrap();

        assert!(user.authenticate(DEFAULT_PASSWORD));
        assert_eq!(user.channels().as_set(), channels(&["inbox", "memos"]));
    }

    #[tokio::test]
    async fn test_fixture_reload_sees_role_changes() {
        let fixture = TestFixture::new();
        fixture.role("staff", &["memos"]).await.unwrap();
        let before = fixture.user("pat", &[], &["staff"]).await.unwrap();

        fixture
            .auth
            .grant_channels(PrincipalKind::Role, "staff", &channels(&["payroll"]))
            .await
            .unwrap();

        assert!(!before.can_see_channel("payroll"));
        let after = fixture.reload("pat").await.unwrap();
        assert!(after.can_see_channel("payroll"));
    }

    #[tokio::test]
    async fn test_reload_missing_user() {
        let fixture = TestFixture::new();
        assert!(fixture.reload("nobody").await.is_err());
    }
}
