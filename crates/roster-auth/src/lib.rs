//! Roster Auth — credential hashing, access tokens, authorization and the
//! account lifecycle service.

pub mod config;
pub mod error;
pub mod gate;
pub mod notify;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use gate::{AuthorizationGate, Identity};
pub use notify::{LogNotifier, NotificationDispatcher, NotificationJob, Notifier, NotifyError};
pub use service::{LoginOutput, UserService};
pub use token::AccessTokenClaims;
