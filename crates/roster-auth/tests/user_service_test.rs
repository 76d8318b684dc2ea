//! Integration tests for the account lifecycle service using in-memory
//! SurrealDB.

use std::sync::{Arc, Mutex};

use roster_auth::{
    AuthConfig, NotificationDispatcher, Notifier, NotifyError, UserService, token,
};
use roster_core::error::RosterError;
use roster_core::models::user::{Profile, User, UserDraft, UserPatch, UserRole};
use roster_db::SurrealUserRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tokio::task::JoinHandle;
use uuid::Uuid;

const PASSWORD: &str = "Str0ng!Pass";

type Service = UserService<SurrealUserRepository<Db>>;

/// Records every delivered job; optionally fails every delivery.
#[derive(Clone, Default)]
struct TestNotifier {
    fail: bool,
    sent: Arc<Mutex<Vec<(&'static str, Uuid)>>>,
}

impl TestNotifier {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn record(&self, kind: &'static str, user: &User) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Delivery("mail server unreachable".into()));
        }
        self.sent.lock().unwrap().push((kind, user.id));
        Ok(())
    }
}

impl Notifier for TestNotifier {
    async fn send_verification_email(&self, user: &User) -> Result<(), NotifyError> {
        self.record("verification", user)
    }

    async fn send_professional_status_email(&self, user: &User) -> Result<(), NotifyError> {
        self.record("professional_status", user)
    }
}

fn test_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "integration-test-secret".into(),
        jwt_issuer: "roster-test".into(),
        ..Default::default()
    }
}

async fn setup_with(config: AuthConfig, notifier: TestNotifier) -> (Service, JoinHandle<()>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    roster_db::run_migrations(&db).await.unwrap();

    let (dispatcher, worker) = NotificationDispatcher::spawn(notifier);
    let svc = UserService::new(SurrealUserRepository::new(db), config, dispatcher);
    (svc, worker)
}

async fn setup() -> Service {
    setup_with(test_config(), TestNotifier::default()).await.0
}

fn draft(email: &str) -> UserDraft {
    UserDraft {
        email: email.into(),
        nickname: None,
        password: PASSWORD.into(),
        role: UserRole::Authenticated,
        profile: Profile::default(),
    }
}

/// Create and verify a user so that it can log in.
async fn verified_user(svc: &Service, email: &str) -> User {
    let user = svc.create(draft(email)).await.unwrap();
    let token = user.verification_token.clone().unwrap();
    assert!(svc.verify_email(user.id, &token).await.unwrap());
    svc.get_by_id(user.id).await.unwrap().unwrap()
}

// -----------------------------------------------------------------------
// Creation
// -----------------------------------------------------------------------

#[tokio::test]
async fn create_normalizes_email_and_hashes_password() {
    let svc = setup().await;
    let user = svc.create(draft("A@Example.COM")).await.unwrap();

    assert_eq!(user.email, "a@example.com");
    assert_ne!(user.password_hash, PASSWORD);
    assert!(user.password_hash.starts_with("$argon2id$"));
    assert!(!user.email_verified);
    assert!(user.verification_token.is_some());
    roster_core::validation::validate_nickname(&user.nickname).unwrap();

    let json = serde_json::to_value(&user).unwrap();
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_in_any_casing_is_rejected() {
    let svc = setup().await;
    svc.create(draft("dup@example.com")).await.unwrap();

    let err = svc.create(draft("DUP@Example.com")).await.unwrap_err();
    assert!(matches!(err, RosterError::DuplicateEmail));
    assert_eq!(svc.count().await.unwrap(), 1);
}

#[tokio::test]
async fn invalid_draft_is_rejected_before_storage() {
    let svc = setup().await;
    let err = svc
        .create(UserDraft {
            password: "weak".into(),
            ..draft("weak@example.com")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::Validation { ref field, .. } if field == "password"));

    let err = svc.create(draft("someone@example.io")).await.unwrap_err();
    assert!(matches!(err, RosterError::Validation { ref field, .. } if field == "email"));

    assert_eq!(svc.count().await.unwrap(), 0);
}

#[tokio::test]
async fn colliding_nickname_is_regenerated() {
    let svc = setup().await;
    svc.create(UserDraft {
        nickname: Some("taken_nick".into()),
        ..draft("first@example.com")
    })
    .await
    .unwrap();

    let second = svc
        .create(UserDraft {
            nickname: Some("taken_nick".into()),
            ..draft("second@example.com")
        })
        .await
        .unwrap();

    assert_ne!(second.nickname, "taken_nick");
    assert_eq!(second.nickname.split('_').count(), 3);
}

#[tokio::test]
async fn exhausted_nickname_budget_fails() {
    let config = AuthConfig {
        nickname_retry_budget: 0,
        ..test_config()
    };
    let (svc, _worker) = setup_with(config, TestNotifier::default()).await;
    svc.create(UserDraft {
        nickname: Some("taken_nick".into()),
        ..draft("first@example.com")
    })
    .await
    .unwrap();

    let err = svc
        .create(UserDraft {
            nickname: Some("taken_nick".into()),
            ..draft("second@example.com")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::ResourceExhausted(_)));
}

#[tokio::test]
async fn admin_is_created_verified_without_notification() {
    let notifier = TestNotifier::default();
    let sent = notifier.sent.clone();
    let (svc, worker) = setup_with(test_config(), notifier).await;

    let admin = svc
        .create(UserDraft {
            role: UserRole::Admin,
            ..draft("root@example.org")
        })
        .await
        .unwrap();
    let member = svc.create(draft("member@example.org")).await.unwrap();

    assert!(admin.email_verified);
    assert_eq!(admin.verification_token, None);
    assert!(!member.email_verified);

    drop(svc);
    worker.await.unwrap();
    assert_eq!(*sent.lock().unwrap(), vec![("verification", member.id)]);
}

#[tokio::test]
async fn failing_notifier_does_not_block_creation() {
    let (svc, _worker) = setup_with(test_config(), TestNotifier::failing()).await;
    let user = svc.create(draft("quiet@example.net")).await.unwrap();
    assert!(svc.get_by_id(user.id).await.unwrap().is_some());
}

#[tokio::test]
async fn register_forces_authenticated_unverified() {
    let svc = setup().await;
    let user = svc
        .register(UserDraft {
            role: UserRole::Admin,
            ..draft("self@example.com")
        })
        .await
        .unwrap();

    assert_eq!(user.role, UserRole::Authenticated);
    assert!(!user.email_verified);
    assert!(user.verification_token.is_some());
}

// -----------------------------------------------------------------------
// Verification
// -----------------------------------------------------------------------

#[tokio::test]
async fn verification_token_works_once_and_promotes_anonymous() {
    let svc = setup().await;
    let user = svc
        .create(UserDraft {
            role: UserRole::Anonymous,
            ..draft("anon@example.com")
        })
        .await
        .unwrap();
    let token = user.verification_token.clone().unwrap();

    assert!(!svc.verify_email(user.id, "not-the-token").await.unwrap());
    assert!(svc.verify_email(user.id, &token).await.unwrap());
    assert!(!svc.verify_email(user.id, &token).await.unwrap());

    let user = svc.get_by_id(user.id).await.unwrap().unwrap();
    assert!(user.email_verified);
    assert_eq!(user.role, UserRole::Authenticated);

    assert!(!svc.verify_email(Uuid::new_v4(), &token).await.unwrap());
}

// -----------------------------------------------------------------------
// Login & lockout
// -----------------------------------------------------------------------

#[tokio::test]
async fn unverified_user_cannot_log_in() {
    let svc = setup().await;
    let user = svc.create(draft("pending@example.com")).await.unwrap();

    let err = svc.login("pending@example.com", PASSWORD).await.unwrap_err();
    assert!(matches!(err, RosterError::InvalidCredentials));

    let user = svc.get_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(user.failed_login_count, 0);
}

#[tokio::test]
async fn unknown_email_is_invalid_credentials() {
    let svc = setup().await;
    let err = svc.login("ghost@example.com", PASSWORD).await.unwrap_err();
    assert!(matches!(err, RosterError::InvalidCredentials));
    assert!(!svc.is_account_locked("ghost@example.com").await.unwrap());
}

#[tokio::test]
async fn successful_login_resets_counter_and_stamps_time() {
    let svc = setup().await;
    let user = verified_user(&svc, "ok@example.com").await;

    assert!(svc.login("ok@example.com", "Wr0ng!Pass").await.is_err());
    let logged_in = svc.login("OK@example.com", PASSWORD).await.unwrap();

    assert_eq!(logged_in.id, user.id);
    assert_eq!(logged_in.failed_login_count, 0);
    assert!(logged_in.last_login_at.is_some());
}

#[tokio::test]
async fn repeated_failures_lock_the_account() {
    let svc = setup().await;
    verified_user(&svc, "user@x.edu").await;

    for _ in 0..5 {
        let err = svc.login("user@x.edu", "Wr0ng!Pass").await.unwrap_err();
        assert!(matches!(err, RosterError::InvalidCredentials));
    }

    assert!(svc.is_account_locked("user@x.edu").await.unwrap());
    let err = svc.login("user@x.edu", PASSWORD).await.unwrap_err();
    assert!(matches!(err, RosterError::AccountLocked));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_failures_still_lock_the_account() {
    let svc = Arc::new(setup().await);
    verified_user(&svc, "burst@example.com").await;

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move {
                // Store write conflicts are retryable; callers try again.
                for _ in 0..20 {
                    match svc.login("burst@example.com", "Wr0ng!Pass").await {
                        Err(e) if e.is_retryable() => continue,
                        other => return other,
                    }
                }
                panic!("login kept conflicting");
            })
        })
        .collect();

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert!(
            matches!(err, RosterError::InvalidCredentials | RosterError::AccountLocked),
            "unexpected error: {err:?}"
        );
    }

    let user = svc.get_by_email("burst@example.com").await.unwrap().unwrap();
    assert!(user.is_locked);
    assert!(user.failed_login_count >= svc.config().max_login_attempts);

    let err = svc.login("burst@example.com", PASSWORD).await.unwrap_err();
    assert!(matches!(err, RosterError::AccountLocked));
}

#[tokio::test]
async fn unlock_allows_login_again() {
    let svc = setup().await;
    let user = verified_user(&svc, "locked@example.com").await;

    for _ in 0..5 {
        let _ = svc.login("locked@example.com", "Wr0ng!Pass").await;
    }
    assert!(svc.is_account_locked("locked@example.com").await.unwrap());

    assert!(svc.unlock_account(user.id).await.unwrap());
    let user = svc.login("locked@example.com", PASSWORD).await.unwrap();
    assert_eq!(user.failed_login_count, 0);
    assert!(!user.is_locked);

    assert!(!svc.unlock_account(Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn login_with_token_issues_bearer() {
    let svc = setup().await;
    verified_user(&svc, "tok@example.com").await;

    let out = svc.login_with_token("tok@example.com", PASSWORD).await.unwrap();
    assert_eq!(out.token_type, "bearer");
    assert_eq!(out.expires_in, svc.config().access_token_lifetime_secs);

    let claims = token::decode_access_token(&out.access_token, svc.config()).unwrap();
    assert_eq!(claims.sub, "tok@example.com");
    assert_eq!(claims.role, UserRole::Authenticated);

    let validated = token::validate_access_token(&out.access_token, svc.config()).unwrap();
    assert_eq!(validated.0.sub, "tok@example.com");
}

#[tokio::test]
async fn reset_password_replaces_credentials() {
    let svc = setup().await;
    let user = verified_user(&svc, "reset@example.com").await;

    let err = svc.reset_password(user.id, "short").await.unwrap_err();
    assert!(matches!(err, RosterError::Validation { .. }));

    assert!(svc.reset_password(user.id, "N3w!Password").await.unwrap());
    assert!(svc.login("reset@example.com", PASSWORD).await.is_err());
    svc.login("reset@example.com", "N3w!Password").await.unwrap();

    assert!(!svc.reset_password(Uuid::new_v4(), "N3w!Password").await.unwrap());
}

// -----------------------------------------------------------------------
// Updates
// -----------------------------------------------------------------------

#[tokio::test]
async fn invalid_update_changes_nothing() {
    let svc = setup().await;
    let user = svc.create(draft("keep@example.com")).await.unwrap();

    let err = svc
        .update(
            user.id,
            UserPatch {
                nickname: Some("fresh_name".into()),
                profile: Profile {
                    linkedin_profile_url: Some("https://example.com/not-linkedin".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::Validation { .. }));

    let after = svc.get_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(after.nickname, user.nickname);
    assert_eq!(after.profile, user.profile);
}

#[tokio::test]
async fn update_rejects_empty_and_conflicting_patches() {
    let svc = setup().await;
    let taken = svc.create(draft("taken@example.com")).await.unwrap();
    let user = svc.create(draft("mover@example.com")).await.unwrap();

    let err = svc.update(user.id, UserPatch::default()).await.unwrap_err();
    assert!(matches!(err, RosterError::Validation { .. }));

    let err = svc
        .update(
            user.id,
            UserPatch {
                email: Some("TAKEN@example.com".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::DuplicateEmail));

    let err = svc
        .update(
            user.id,
            UserPatch {
                nickname: Some(taken.nickname.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::DuplicateNickname));

    let err = svc
        .update(
            user.id,
            UserPatch {
                nickname: Some("Admin".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::Validation { .. }));

    let err = svc
        .update(
            Uuid::new_v4(),
            UserPatch {
                nickname: Some("nobody_here".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::NotFound { .. }));
}

#[tokio::test]
async fn update_applies_supplied_fields() {
    let svc = setup().await;
    let user = svc.create(draft("edit@example.com")).await.unwrap();

    let updated = svc
        .update(
            user.id,
            UserPatch {
                email: Some("Edited@Example.com".into()),
                role: Some(UserRole::Manager),
                profile: Profile {
                    first_name: Some("Mary-Jane".into()),
                    github_profile_url: Some("https://github.com/mj".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.email, "edited@example.com");
    assert_eq!(updated.role, UserRole::Manager);
    assert_eq!(updated.nickname, user.nickname);
    assert_eq!(updated.profile.first_name.as_deref(), Some("Mary-Jane"));
}

#[tokio::test]
async fn update_profile_ignores_email_and_role() {
    let svc = setup().await;
    let user = svc.create(draft("me@example.com")).await.unwrap();

    let updated = svc
        .update_profile(
            "me@example.com",
            UserPatch {
                email: Some("other@example.com".into()),
                role: Some(UserRole::Admin),
                profile: Profile {
                    bio: Some("Hello there".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.id, user.id);
    assert_eq!(updated.email, "me@example.com");
    assert_eq!(updated.role, UserRole::Authenticated);
    assert_eq!(updated.profile.bio.as_deref(), Some("Hello there"));
}

#[tokio::test]
async fn professional_status_survives_failing_notifier() {
    let (svc, worker) = setup_with(test_config(), TestNotifier::failing()).await;
    let user = svc.create(draft("pro@example.com")).await.unwrap();

    let updated = svc.update_professional_status(user.id, true).await.unwrap();
    assert!(updated.is_professional);
    assert!(updated.professional_status_updated_at.is_some());

    let err = svc
        .update_professional_status(Uuid::new_v4(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, RosterError::NotFound { .. }));

    drop(svc);
    worker.await.unwrap();
}

#[tokio::test]
async fn professional_status_notifies_user() {
    let notifier = TestNotifier::default();
    let sent = notifier.sent.clone();
    let (svc, worker) = setup_with(test_config(), notifier).await;
    let admin = svc
        .create(UserDraft {
            role: UserRole::Admin,
            ..draft("boss@example.com")
        })
        .await
        .unwrap();

    svc.update_professional_status(admin.id, true).await.unwrap();

    drop(svc);
    worker.await.unwrap();
    assert_eq!(
        *sent.lock().unwrap(),
        vec![("professional_status", admin.id)]
    );
}

// -----------------------------------------------------------------------
// Delete & reads
// -----------------------------------------------------------------------

#[tokio::test]
async fn delete_reports_absence() {
    let svc = setup().await;
    let user = svc.create(draft("bye@example.com")).await.unwrap();

    assert!(svc.delete(user.id).await.unwrap());
    assert!(!svc.delete(user.id).await.unwrap());
    assert!(svc.get_by_id(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn lookups_and_listing() {
    let svc = setup().await;
    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(svc.create(draft(&format!("list{i}@example.com"))).await.unwrap());
    }

    let first = &ids[0];
    assert_eq!(
        svc.get_by_email("LIST0@example.com").await.unwrap().unwrap().id,
        first.id
    );
    assert_eq!(
        svc.get_by_nickname(&first.nickname).await.unwrap().unwrap().id,
        first.id
    );
    assert!(svc.get_by_email("nope@example.com").await.unwrap().is_none());

    let page = svc.list_users(1, 2).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total, 4);
    assert_eq!(svc.count().await.unwrap(), 4);

    let everyone = svc.list_users(0, 10).await.unwrap();
    let everyone_ids: Vec<_> = everyone.items.iter().map(|u| u.id).collect();
    let created_ids: Vec<_> = ids.iter().map(|u| u.id).collect();
    assert_eq!(everyone_ids, created_ids);

    let page_ids: Vec<_> = page.items.iter().map(|u| u.id).collect();
    assert_eq!(page_ids, &created_ids[1..3]);
}
