//! Authentication and account-lifecycle configuration.

use serde::Deserialize;

/// Configuration for token issuance, password hashing and lockout.
///
/// Loaded once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for HS256 access tokens. Rotating it invalidates every
    /// outstanding token.
    pub jwt_secret: String,
    /// JWT issuer (`iss` claim).
    pub jwt_issuer: String,
    /// Access token lifetime in seconds (default: 1800 = 30 minutes).
    pub access_token_lifetime_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
    /// Consecutive failed logins before the account is locked (default: 5).
    pub max_login_attempts: u32,
    /// How many times a colliding nickname is regenerated before `create`
    /// gives up (default: 5).
    pub nickname_retry_budget: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_issuer: "roster".into(),
            access_token_lifetime_secs: 1800,
            pepper: None,
            max_login_attempts: 5,
            nickname_retry_budget: 5,
        }
    }
}
