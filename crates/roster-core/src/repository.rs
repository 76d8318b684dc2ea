//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations must enforce
//! email and nickname uniqueness with store-level constraints and report
//! violations as [`RosterError::DuplicateEmail`] /
//! [`RosterError::DuplicateNickname`]; the service layer's existence
//! checks are only a pre-check.
//!
//! [`RosterError::DuplicateEmail`]: crate::error::RosterError::DuplicateEmail
//! [`RosterError::DuplicateNickname`]: crate::error::RosterError::DuplicateNickname

use uuid::Uuid;

use crate::error::RosterResult;
use crate::models::user::{CreateUser, UpdateUser, User};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 10,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = RosterResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = RosterResult<User>> + Send;
    /// `email` must already be normalized.
    fn get_by_email(&self, email: &str) -> impl Future<Output = RosterResult<User>> + Send;
    fn get_by_nickname(&self, nickname: &str) -> impl Future<Output = RosterResult<User>> + Send;
    /// Apply every `Some` field of `input` in a single statement.
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = RosterResult<User>> + Send;
    /// Hard delete.
    fn delete(&self, id: Uuid) -> impl Future<Output = RosterResult<()>> + Send;
    /// Ordered by creation time, then id.
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = RosterResult<PaginatedResult<User>>> + Send;
    fn count(&self) -> impl Future<Output = RosterResult<u64>> + Send;

    /// Atomically increment `failed_login_count` and return the
    /// post-increment record.
    fn increment_failed_logins(&self, id: Uuid) -> impl Future<Output = RosterResult<User>> + Send;

    /// Set `email_verified`, clear `verification_token` and promote an
    /// `ANONYMOUS` role to `AUTHENTICATED`, only if the stored token equals
    /// `token`. Returns `false` when nothing matched.
    fn consume_verification_token(
        &self,
        id: Uuid,
        token: &str,
    ) -> impl Future<Output = RosterResult<bool>> + Send;
}
