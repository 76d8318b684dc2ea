//! Account lifecycle service: creation, login with lockout, verification
//! and administrative updates.

use chrono::Utc;
use roster_core::error::{RosterError, RosterResult};
use roster_core::models::user::{CreateUser, UpdateUser, User, UserDraft, UserPatch, UserRole};
use roster_core::nickname::generate_nickname;
use roster_core::repository::{PaginatedResult, Pagination, UserRepository};
use roster_core::validation;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::notify::{NotificationDispatcher, NotificationJob};
use crate::password;
use crate::token;

/// Successful token login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed JWT access token.
    pub access_token: String,
    /// Always `"bearer"`.
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Account lifecycle service.
///
/// Generic over the repository implementation so that the auth layer
/// has no dependency on the database crate.
pub struct UserService<U: UserRepository> {
    repo: U,
    config: AuthConfig,
    notifications: NotificationDispatcher,
}

/// Turn a `NotFound` into `None`, passing every other error through.
fn optional<T>(result: RosterResult<T>) -> RosterResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RosterError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Turn a `NotFound` into `false`.
fn found(result: RosterResult<()>) -> RosterResult<bool> {
    optional(result).map(|r| r.is_some())
}

impl<U: UserRepository> UserService<U> {
    pub fn new(repo: U, config: AuthConfig, notifications: NotificationDispatcher) -> Self {
        Self {
            repo,
            config,
            notifications,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn repository(&self) -> &U {
        &self.repo
    }

    // -------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------

    /// Administrative creation. ADMIN drafts are created verified; every
    /// other role receives a verification token and email.
    pub async fn create(&self, draft: UserDraft) -> RosterResult<User> {
        let draft = validation::validate_draft(draft)?;
        self.insert(draft).await
    }

    /// Self-service registration: always `AUTHENTICATED`, always
    /// unverified.
    pub async fn register(&self, draft: UserDraft) -> RosterResult<User> {
        let draft = validation::validate_draft(UserDraft {
            role: UserRole::Authenticated,
            ..draft
        })?;
        self.insert(draft).await
    }

    async fn insert(&self, draft: UserDraft) -> RosterResult<User> {
        if optional(self.repo.get_by_email(&draft.email).await)?.is_some() {
            return Err(RosterError::DuplicateEmail);
        }

        let password_hash = password::hash_password(&draft.password, self.config.pepper.as_deref())?;
        let (email_verified, verification_token) = match draft.role {
            UserRole::Admin => (true, None),
            _ => (false, Some(token::generate_verification_token())),
        };

        let mut regenerations = 0;
        let mut nickname = draft.nickname.unwrap_or_else(generate_nickname);
        let user = loop {
            if optional(self.repo.get_by_nickname(&nickname).await)?.is_none() {
                let input = CreateUser {
                    email: draft.email.clone(),
                    nickname: nickname.clone(),
                    password_hash: password_hash.clone(),
                    role: draft.role,
                    email_verified,
                    verification_token: verification_token.clone(),
                    profile: draft.profile.clone(),
                };
                match self.repo.create(input).await {
                    Ok(user) => break user,
                    // Lost a race for the nickname; regenerate below.
                    Err(RosterError::DuplicateNickname) => {}
                    Err(e) => return Err(e),
                }
            }

            if regenerations >= self.config.nickname_retry_budget {
                warn!(
                    email = %draft.email,
                    attempts = regenerations + 1,
                    "Nickname retry budget exhausted"
                );
                return Err(RosterError::ResourceExhausted(
                    "could not allocate a unique nickname".into(),
                ));
            }
            debug!(taken = %nickname, "Nickname taken, regenerating");
            regenerations += 1;
            nickname = generate_nickname();
        };

        info!(user_id = %user.id, role = %user.role, "User created");

        if user.verification_token.is_some() {
            self.notifications
                .enqueue(NotificationJob::Verification(user.clone()));
        }

        Ok(user)
    }

    // -------------------------------------------------------------------
    // Authentication & lockout
    // -------------------------------------------------------------------

    /// Check credentials, applying lockout bookkeeping.
    ///
    /// Never reveals whether the email or the password was wrong.
    pub async fn login(&self, email: &str, password: &str) -> RosterResult<User> {
        let Ok(email) = validation::normalize_email(email) else {
            return Err(AuthError::InvalidCredentials.into());
        };
        let Some(user) = optional(self.repo.get_by_email(&email).await)? else {
            return Err(AuthError::InvalidCredentials.into());
        };

        if user.is_locked {
            return Err(AuthError::AccountLocked.into());
        }
        if !user.email_verified {
            debug!(user_id = %user.id, "Login attempt on unverified account");
            return Err(AuthError::InvalidCredentials.into());
        }

        let valid =
            password::verify_password(password, &user.password_hash, self.config.pepper.as_deref())?;

        if !valid {
            let counted = self.repo.increment_failed_logins(user.id).await?;
            if counted.failed_login_count >= self.config.max_login_attempts && !counted.is_locked {
                self.repo
                    .update(
                        user.id,
                        UpdateUser {
                            is_locked: Some(true),
                            ..Default::default()
                        },
                    )
                    .await?;
                warn!(
                    user_id = %user.id,
                    failed_login_count = counted.failed_login_count,
                    "Account locked after repeated failed logins"
                );
            }
            return Err(AuthError::InvalidCredentials.into());
        }

        let user = self
            .repo
            .update(
                user.id,
                UpdateUser {
                    failed_login_count: Some(0),
                    last_login_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// [`login`](Self::login) followed by access token issuance.
    pub async fn login_with_token(&self, email: &str, password: &str) -> RosterResult<LoginOutput> {
        let user = self.login(email, password).await?;
        let ttl = self.config.access_token_lifetime_secs;
        let access_token = token::issue_access_token(&user.email, user.role, ttl, &self.config)?;

        Ok(LoginOutput {
            access_token,
            token_type: "bearer",
            expires_in: ttl,
        })
    }

    /// Pure read. Unknown or malformed emails are reported as unlocked.
    pub async fn is_account_locked(&self, email: &str) -> RosterResult<bool> {
        let Ok(email) = validation::normalize_email(email) else {
            return Ok(false);
        };
        Ok(optional(self.repo.get_by_email(&email).await)?
            .map(|u| u.is_locked)
            .unwrap_or(false))
    }

    /// Clear the lock and the failed-login counter.
    pub async fn unlock_account(&self, user_id: Uuid) -> RosterResult<bool> {
        let result = self
            .repo
            .update(
                user_id,
                UpdateUser {
                    is_locked: Some(false),
                    failed_login_count: Some(0),
                    ..Default::default()
                },
            )
            .await
            .map(|_| ());
        let unlocked = found(result)?;
        if unlocked {
            info!(%user_id, "Account unlocked");
        }
        Ok(unlocked)
    }

    /// Replace the password (policy-checked) and clear the failed-login
    /// counter.
    pub async fn reset_password(&self, user_id: Uuid, new_password: &str) -> RosterResult<bool> {
        validation::validate_password(new_password)?;
        let password_hash = password::hash_password(new_password, self.config.pepper.as_deref())?;

        let result = self
            .repo
            .update(
                user_id,
                UpdateUser {
                    password_hash: Some(password_hash),
                    failed_login_count: Some(0),
                    ..Default::default()
                },
            )
            .await
            .map(|_| ());
        let reset = found(result)?;
        if reset {
            info!(%user_id, "Password reset");
        }
        Ok(reset)
    }

    /// Consume a verification token. A token works exactly once.
    pub async fn verify_email(&self, user_id: Uuid, token: &str) -> RosterResult<bool> {
        let verified = self.repo.consume_verification_token(user_id, token).await?;
        if verified {
            info!(%user_id, "Email verified");
        } else {
            debug!(%user_id, "Verification token rejected");
        }
        Ok(verified)
    }

    // -------------------------------------------------------------------
    // Updates
    // -------------------------------------------------------------------

    /// Administrative partial update. Either every supplied field is
    /// applied or none is.
    pub async fn update(&self, user_id: Uuid, patch: UserPatch) -> RosterResult<User> {
        let patch = validation::validate_patch(patch)?;
        self.repo.get_by_id(user_id).await?;

        if let Some(ref email) = patch.email {
            if let Some(other) = optional(self.repo.get_by_email(email).await)? {
                if other.id != user_id {
                    return Err(RosterError::DuplicateEmail);
                }
            }
        }
        if let Some(ref nickname) = patch.nickname {
            if let Some(other) = optional(self.repo.get_by_nickname(nickname).await)? {
                if other.id != user_id {
                    return Err(RosterError::DuplicateNickname);
                }
            }
        }

        let user = self.repo.update(user_id, patch.into()).await?;
        info!(%user_id, "User updated");
        Ok(user)
    }

    /// Self-service update for the signed-in user. Email and role are
    /// not editable here.
    pub async fn update_profile(&self, email: &str, patch: UserPatch) -> RosterResult<User> {
        let patch = UserPatch {
            email: None,
            role: None,
            ..patch
        };
        let user = self.repo.get_by_email(email).await?;
        self.update(user.id, patch).await
    }

    /// Set the professional flag, then notify the user best-effort.
    pub async fn update_professional_status(
        &self,
        user_id: Uuid,
        is_professional: bool,
    ) -> RosterResult<User> {
        let user = self
            .repo
            .update(
                user_id,
                UpdateUser {
                    is_professional: Some(is_professional),
                    professional_status_updated_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        info!(%user_id, is_professional, "Professional status updated");

        self.notifications
            .enqueue(NotificationJob::ProfessionalStatus(user.clone()));
        Ok(user)
    }

    /// Hard delete.
    pub async fn delete(&self, user_id: Uuid) -> RosterResult<bool> {
        let deleted = found(self.repo.delete(user_id).await)?;
        if deleted {
            info!(%user_id, "User deleted");
        }
        Ok(deleted)
    }

    // -------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------

    pub async fn get_by_id(&self, user_id: Uuid) -> RosterResult<Option<User>> {
        optional(self.repo.get_by_id(user_id).await)
    }

    pub async fn get_by_email(&self, email: &str) -> RosterResult<Option<User>> {
        let Ok(email) = validation::normalize_email(email) else {
            return Ok(None);
        };
        optional(self.repo.get_by_email(&email).await)
    }

    pub async fn get_by_nickname(&self, nickname: &str) -> RosterResult<Option<User>> {
        optional(self.repo.get_by_nickname(nickname).await)
    }

    /// One page of users ordered by creation time, then id.
    pub async fn list_users(&self, skip: u64, limit: u64) -> RosterResult<PaginatedResult<User>> {
        self.repo
            .list(Pagination {
                offset: skip,
                limit,
            })
            .await
    }

    pub async fn count(&self) -> RosterResult<u64> {
        self.repo.count().await
    }
}
