//! Fire-and-forget user notifications.
//!
//! Mutations commit first, then enqueue a [`NotificationJob`]. A single
//! worker task drains the queue; delivery failures are logged on the
//! `roster::dead_letter` target and never reach the caller.

use roster_core::models::user::User;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

const DEAD_LETTER: &str = "roster::dead_letter";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("user {user_id} has no pending verification token")]
    MissingToken { user_id: Uuid },

    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Outbound message channel (email, chat, ...).
pub trait Notifier: Send + Sync + 'static {
    fn send_verification_email(
        &self,
        user: &User,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;

    fn send_professional_status_email(
        &self,
        user: &User,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// A queued notification, carrying the committed user snapshot.
#[derive(Debug, Clone)]
pub enum NotificationJob {
    Verification(User),
    ProfessionalStatus(User),
}

impl NotificationJob {
    fn kind(&self) -> &'static str {
        match self {
            NotificationJob::Verification(_) => "verification",
            NotificationJob::ProfessionalStatus(_) => "professional_status",
        }
    }

    fn user(&self) -> &User {
        match self {
            NotificationJob::Verification(user) | NotificationJob::ProfessionalStatus(user) => user,
        }
    }
}

/// Cloneable handle for enqueueing notifications.
///
/// The worker exits once every clone has been dropped and the queue is
/// drained.
#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<NotificationJob>,
}

impl NotificationDispatcher {
    /// Start the delivery worker on the current tokio runtime.
    pub fn spawn<N: Notifier>(notifier: N) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_worker(notifier, rx));
        (Self { tx }, handle)
    }

    /// Queue a job. Never blocks and never fails the caller.
    pub fn enqueue(&self, job: NotificationJob) {
        if let Err(mpsc::error::SendError(job)) = self.tx.send(job) {
            warn!(
                target: DEAD_LETTER,
                kind = job.kind(),
                user_id = %job.user().id,
                "Notification worker is gone, dropping job"
            );
        }
    }
}

async fn run_worker<N: Notifier>(notifier: N, mut rx: mpsc::UnboundedReceiver<NotificationJob>) {
    while let Some(job) = rx.recv().await {
        let result = match &job {
            NotificationJob::Verification(user) => notifier.send_verification_email(user).await,
            NotificationJob::ProfessionalStatus(user) => {
                notifier.send_professional_status_email(user).await
            }
        };

        match result {
            Ok(()) => debug!(kind = job.kind(), user_id = %job.user().id, "Notification sent"),
            Err(e) => warn!(
                target: DEAD_LETTER,
                kind = job.kind(),
                user_id = %job.user().id,
                error = %e,
                "Notification delivery failed"
            ),
        }
    }
    debug!("Notification worker stopped");
}

/// Notifier that writes messages to the log instead of sending them.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    /// Public base URL used to build verification links.
    pub base_url: String,
}

impl LogNotifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn verification_link(&self, user: &User) -> Result<String, NotifyError> {
        let token = user
            .verification_token
            .as_deref()
            .ok_or(NotifyError::MissingToken { user_id: user.id })?;
        Ok(format!(
            "{}/verify-email/{}/{}",
            self.base_url.trim_end_matches('/'),
            user.id,
            token
        ))
    }
}

impl Notifier for LogNotifier {
    async fn send_verification_email(&self, user: &User) -> Result<(), NotifyError> {
        let link = self.verification_link(user)?;
        info!(to = %user.email, nickname = %user.nickname, %link, "Verification email");
        Ok(())
    }

    async fn send_professional_status_email(&self, user: &User) -> Result<(), NotifyError> {
        info!(
            to = %user.email,
            is_professional = user.is_professional,
            "Professional status email"
        );
        Ok(())
    }
}
