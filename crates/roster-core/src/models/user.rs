//! User domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    Anonymous,
    Authenticated,
    Manager,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Anonymous => "ANONYMOUS",
            UserRole::Authenticated => "AUTHENTICATED",
            UserRole::Manager => "MANAGER",
            UserRole::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ANONYMOUS" => Ok(UserRole::Anonymous),
            "AUTHENTICATED" => Ok(UserRole::Authenticated),
            "MANAGER" => Ok(UserRole::Manager),
            "ADMIN" => Ok(UserRole::Admin),
            other => Err(format!("unknown user role: {other}")),
        }
    }
}

/// Optional profile attributes shared by drafts, patches and records.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Profile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
    pub linkedin_profile_url: Option<String>,
    pub github_profile_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Always lowercase.
    pub email: String,
    pub nickname: String,
    /// Argon2id PHC string. Never the plaintext.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub email_verified: bool,
    /// Present only while `email_verified` is false.
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    pub failed_login_count: u32,
    pub is_locked: bool,
    pub is_professional: bool,
    pub professional_status_updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub profile: Profile,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied input for `create` / `register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDraft {
    pub email: String,
    pub nickname: Option<String>,
    /// Raw password (hashed with Argon2id before storage).
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Fully prepared record handed to the repository on insert.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub nickname: String,
    pub password_hash: String,
    pub role: UserRole,
    pub email_verified: bool,
    pub verification_token: Option<String>,
    pub profile: Profile,
}

/// Partial update of user-editable fields. `None` means no change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub role: Option<UserRole>,
    #[serde(flatten)]
    pub profile: Profile,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.nickname.is_none()
            && self.role.is_none()
            && self.profile == Profile::default()
    }
}

/// Repository-level update. Each field is applied only when `Some`.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<UserRole>,
    pub is_professional: Option<bool>,
    pub professional_status_updated_at: Option<DateTime<Utc>>,
    pub failed_login_count: Option<u32>,
    pub is_locked: Option<bool>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub profile: Profile,
}

impl From<UserPatch> for UpdateUser {
    fn from(patch: UserPatch) -> Self {
        Self {
            email: patch.email,
            nickname: patch.nickname,
            role: patch.role,
            profile: patch.profile,
            ..Default::default()
        }
    }
}
