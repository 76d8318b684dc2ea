//! Authorization gate: bearer token → identity → role check.

use roster_core::error::{RosterError, RosterResult};
use roster_core::models::user::{User, UserRole};
use roster_core::repository::UserRepository;
use tracing::debug;

use crate::config::AuthConfig;
use crate::token;

/// Roles allowed to administer other accounts.
pub const ADMIN_OR_MANAGER: &[UserRole] = &[UserRole::Admin, UserRole::Manager];

/// Every role that can hold a verified, signed-in session.
pub const ANY_SIGNED_IN: &[UserRole] = &[
    UserRole::Admin,
    UserRole::Manager,
    UserRole::Authenticated,
];

/// Caller identity proven by a valid access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Token subject (normalized email).
    pub subject: String,
    pub role: UserRole,
}

/// Checks bearer tokens against the process-wide signing configuration.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    config: AuthConfig,
}

impl AuthorizationGate {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Resolve the caller and require one of `allowed`.
    ///
    /// Missing, malformed, tampered and expired tokens all yield
    /// [`RosterError::Unauthorized`]; a valid token with a role outside
    /// `allowed` yields [`RosterError::Forbidden`].
    pub fn require(&self, bearer: Option<&str>, allowed: &[UserRole]) -> RosterResult<Identity> {
        let raw = bearer.ok_or(RosterError::Unauthorized)?;

        let claims = token::validate_access_token(raw, &self.config)
            .map_err(|e| {
                debug!(error = %e, "Rejected access token");
                RosterError::Unauthorized
            })?
            .0;

        if !allowed.contains(&claims.role) {
            debug!(subject = %claims.sub, role = %claims.role, "Role not permitted");
            return Err(RosterError::Forbidden);
        }

        Ok(Identity {
            subject: claims.sub,
            role: claims.role,
        })
    }
}

/// Re-fetch the user named by the token subject.
///
/// A subject that no longer exists is treated as an invalid credential.
pub async fn resolve_current_user<U: UserRepository>(
    identity: &Identity,
    repo: &U,
) -> RosterResult<User> {
    repo.get_by_email(&identity.subject)
        .await
        .map_err(|e| match e {
            RosterError::NotFound { .. } => RosterError::Unauthorized,
            other => other,
        })
}
