//! Database-specific error types and conversions.

use roster_core::error::RosterError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Corrupt record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique index violated: {index}")]
    UniqueViolation { index: &'static str },
}

/// Unique index names defined by the schema. Kept in one place so
/// constraint violations can be mapped back to domain errors.
pub(crate) const EMAIL_INDEX: &str = "idx_user_email";
pub(crate) const NICKNAME_INDEX: &str = "idx_user_nickname";

impl DbError {
    /// Classify a failed write. SurrealDB reports unique index violations
    /// as plain errors whose message names the index.
    pub(crate) fn from_write(message: String) -> Self {
        if message.contains(EMAIL_INDEX) {
            DbError::UniqueViolation { index: EMAIL_INDEX }
        } else if message.contains(NICKNAME_INDEX) {
            DbError::UniqueViolation {
                index: NICKNAME_INDEX,
            }
        } else {
            DbError::Write(message)
        }
    }
}

impl From<DbError> for RosterError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => RosterError::NotFound { entity, id },
            DbError::UniqueViolation { index } if index == EMAIL_INDEX => {
                RosterError::DuplicateEmail
            }
            DbError::UniqueViolation { .. } => RosterError::DuplicateNickname,
            DbError::Decode(msg) => RosterError::Internal(msg),
            other => RosterError::Database(other.to_string()),
        }
    }
}
