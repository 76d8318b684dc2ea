//! Authentication error types.

use roster_core::error::RosterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is locked")]
    AccountLocked,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for RosterError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => RosterError::InvalidCredentials,
            AuthError::AccountLocked => RosterError::AccountLocked,
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => RosterError::Unauthorized,
            AuthError::Crypto(msg) => RosterError::Crypto(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_collapse_to_unauthorized() {
        assert!(matches!(
            RosterError::from(AuthError::TokenExpired),
            RosterError::Unauthorized
        ));
        assert!(matches!(
            RosterError::from(AuthError::TokenInvalid("bad signature".into())),
            RosterError::Unauthorized
        ));
    }

    #[test]
    fn crypto_message_is_kept() {
        match RosterError::from(AuthError::Crypto("salt".into())) {
            RosterError::Crypto(msg) => assert_eq!(msg, "salt"),
            other => panic!("expected Crypto, got {other:?}"),
        }
    }
}
