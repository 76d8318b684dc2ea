//! SurrealDB implementation of [`UserRepository`].
//!
//! Records are keyed by the user's UUID (`user:⟨uuid⟩`). Every mutation
//! is a single statement, so a cancelled request either applied all of
//! its fields or none.

use chrono::{DateTime, Utc};
use roster_core::error::RosterResult;
use roster_core::models::user::{CreateUser, Profile, UpdateUser, User, UserRole};
use roster_core::repository::{PaginatedResult, Pagination, UserRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    email: String,
    nickname: String,
    password_hash: String,
    role: String,
    email_verified: bool,
    verification_token: Option<String>,
    failed_login_count: u32,
    is_locked: bool,
    is_professional: bool,
    professional_status_updated_at: Option<DateTime<Utc>>,
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
    profile_picture_url: Option<String>,
    linkedin_profile_url: Option<String>,
    github_profile_url: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record key via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    email: String,
    nickname: String,
    password_hash: String,
    role: String,
    email_verified: bool,
    verification_token: Option<String>,
    failed_login_count: u32,
    is_locked: bool,
    is_professional: bool,
    professional_status_updated_at: Option<DateTime<Utc>>,
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
    profile_picture_url: Option<String>,
    linkedin_profile_url: Option<String>,
    github_profile_url: Option<String>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<UserRole, DbError> {
    s.parse().map_err(DbError::Decode)
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            email: self.email,
            nickname: self.nickname,
            password_hash: self.password_hash,
            role: parse_role(&self.role)?,
            email_verified: self.email_verified,
            verification_token: self.verification_token,
            failed_login_count: self.failed_login_count,
            is_locked: self.is_locked,
            is_professional: self.is_professional,
            professional_status_updated_at: self.professional_status_updated_at,
            profile: Profile {
                first_name: self.first_name,
                last_name: self.last_name,
                bio: self.bio,
                profile_picture_url: self.profile_picture_url,
                linkedin_profile_url: self.linkedin_profile_url,
                github_profile_url: self.github_profile_url,
            },
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?;
        UserRow {
            email: self.email,
            nickname: self.nickname,
            password_hash: self.password_hash,
            role: self.role,
            email_verified: self.email_verified,
            verification_token: self.verification_token,
            failed_login_count: self.failed_login_count,
            is_locked: self.is_locked,
            is_professional: self.is_professional,
            professional_status_updated_at: self.professional_status_updated_at,
            first_name: self.first_name,
            last_name: self.last_name,
            bio: self.bio,
            profile_picture_url: self.profile_picture_url,
            linkedin_profile_url: self.linkedin_profile_url,
            github_profile_url: self.github_profile_url,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_user(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn not_found(id: impl Into<String>) -> DbError {
    DbError::NotFound {
        entity: "user".into(),
        id: id.into(),
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find_one(&self, field: &'static str, value: &str) -> RosterResult<User> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM user \
             WHERE {field} = $value LIMIT 1"
        );
        let mut result = self
            .db
            .query(query)
            .bind(("value", value.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| not_found(format!("{field}={value}")))?;

        Ok(row.try_into_user()?)
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> RosterResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let profile = input.profile;

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 email = $email, nickname = $nickname, \
                 password_hash = $password_hash, role = $role, \
                 email_verified = $email_verified, \
                 verification_token = $verification_token, \
                 failed_login_count = 0, is_locked = false, \
                 is_professional = false, \
                 professional_status_updated_at = NONE, \
                 first_name = $first_name, last_name = $last_name, \
                 bio = $bio, profile_picture_url = $profile_picture_url, \
                 linkedin_profile_url = $linkedin_profile_url, \
                 github_profile_url = $github_profile_url, \
                 last_login_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("nickname", input.nickname))
            .bind(("password_hash", input.password_hash))
            .bind(("role", input.role.as_str().to_string()))
            .bind(("email_verified", input.email_verified))
            .bind(("verification_token", input.verification_token))
            .bind(("first_name", profile.first_name))
            .bind(("last_name", profile.last_name))
            .bind(("bio", profile.bio))
            .bind(("profile_picture_url", profile.profile_picture_url))
            .bind(("linkedin_profile_url", profile.linkedin_profile_url))
            .bind(("github_profile_url", profile.github_profile_url))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| not_found(id_str))?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> RosterResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| not_found(id_str))?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_email(&self, email: &str) -> RosterResult<User> {
        self.find_one("email", email).await
    }

    async fn get_by_nickname(&self, nickname: &str) -> RosterResult<User> {
        self.find_one("nickname", nickname).await
    }

    async fn update(&self, id: Uuid, input: UpdateUser) -> RosterResult<User> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.nickname.is_some() {
            sets.push("nickname = $nickname");
        }
        if input.password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.is_professional.is_some() {
            sets.push("is_professional = $is_professional");
        }
        if input.professional_status_updated_at.is_some() {
            sets.push("professional_status_updated_at = $professional_status_updated_at");
        }
        if input.failed_login_count.is_some() {
            sets.push("failed_login_count = $failed_login_count");
        }
        if input.is_locked.is_some() {
            sets.push("is_locked = $is_locked");
        }
        if input.last_login_at.is_some() {
            sets.push("last_login_at = $last_login_at");
        }
        let profile = input.profile;
        if profile.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if profile.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        if profile.bio.is_some() {
            sets.push("bio = $bio");
        }
        if profile.profile_picture_url.is_some() {
            sets.push("profile_picture_url = $profile_picture_url");
        }
        if profile.linkedin_profile_url.is_some() {
            sets.push("linkedin_profile_url = $linkedin_profile_url");
        }
        if profile.github_profile_url.is_some() {
            sets.push("github_profile_url = $github_profile_url");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(nickname) = input.nickname {
            builder = builder.bind(("nickname", nickname));
        }
        if let Some(password_hash) = input.password_hash {
            builder = builder.bind(("password_hash", password_hash));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role.as_str().to_string()));
        }
        if let Some(is_professional) = input.is_professional {
            builder = builder.bind(("is_professional", is_professional));
        }
        if let Some(at) = input.professional_status_updated_at {
            builder = builder.bind(("professional_status_updated_at", at));
        }
        if let Some(failed_login_count) = input.failed_login_count {
            builder = builder.bind(("failed_login_count", failed_login_count));
        }
        if let Some(is_locked) = input.is_locked {
            builder = builder.bind(("is_locked", is_locked));
        }
        if let Some(last_login_at) = input.last_login_at {
            builder = builder.bind(("last_login_at", last_login_at));
        }
        if let Some(v) = profile.first_name {
            builder = builder.bind(("first_name", v));
        }
        if let Some(v) = profile.last_name {
            builder = builder.bind(("last_name", v));
        }
        if let Some(v) = profile.bio {
            builder = builder.bind(("bio", v));
        }
        if let Some(v) = profile.profile_picture_url {
            builder = builder.bind(("profile_picture_url", v));
        }
        if let Some(v) = profile.linkedin_profile_url {
            builder = builder.bind(("linkedin_profile_url", v));
        }
        if let Some(v) = profile.github_profile_url {
            builder = builder.bind(("github_profile_url", v));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_write(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| not_found(id_str))?;

        Ok(row.into_user(id)?)
    }

    async fn delete(&self, id: Uuid) -> RosterResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('user', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(not_found(id_str).into());
        }
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> RosterResult<PaginatedResult<User>> {
        let total = self.count().await?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 ORDER BY created_at ASC, record_id ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count(&self) -> RosterResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn increment_failed_logins(&self, id: Uuid) -> RosterResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 failed_login_count += 1, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| not_found(id_str))?;

        Ok(row.into_user(id)?)
    }

    async fn consume_verification_token(&self, id: Uuid, token: &str) -> RosterResult<bool> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 email_verified = true, \
                 verification_token = NONE, \
                 role = IF role = 'ANONYMOUS' { 'AUTHENTICATED' } ELSE { role }, \
                 updated_at = time::now() \
                 WHERE email_verified = false AND verification_token = $candidate",
            )
            .bind(("id", id.to_string()))
            .bind(("candidate", token.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }
}
