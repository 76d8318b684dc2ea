//! Error types for the Roster system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Validation error on `{field}`: {message}")]
    Validation { field: String, message: String },

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Nickname already exists")]
    DuplicateNickname,

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Account locked due to too many failed login attempts")]
    AccountLocked,

    #[error("Could not validate credentials")]
    Unauthorized,

    #[error("Operation not permitted")]
    Forbidden,

    #[error("Invalid or expired verification token")]
    InvalidOrExpiredToken,

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RosterError {
    /// Shorthand for a field-level validation failure.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a missing user.
    pub fn user_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "user".into(),
            id: id.to_string(),
        }
    }

    /// Store-layer failures may succeed on retry; business-rule failures
    /// never will.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

pub type RosterResult<T> = Result<T, RosterError>;
