use std::sync::Arc;

use roster_auth::{
    AuthorizationGate, LogNotifier, NotificationDispatcher, UserService,
};
use roster_db::{DbError, DbManager, SurrealUserRepository};
use surrealdb::engine::any::Any;
use tokio::task::JoinHandle;

use crate::config::AppConfig;

pub type Users = UserService<SurrealUserRepository<Any>>;

/// Shared request state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<Users>,
    pub gate: AuthorizationGate,
}

impl AppState {
    /// Connect to the store, start the notification worker and wire the
    /// service. The returned handle completes once every clone of the
    /// state has been dropped.
    pub async fn build(config: &AppConfig) -> Result<(Self, JoinHandle<()>), DbError> {
        let db = DbManager::connect(&config.database).await?;
        let (dispatcher, worker) =
            NotificationDispatcher::spawn(LogNotifier::new(config.server.base_url.clone()));

        let users = UserService::new(
            SurrealUserRepository::new(db.client().clone()),
            config.auth.clone(),
            dispatcher,
        );

        let state = Self {
            users: Arc::new(users),
            gate: AuthorizationGate::new(config.auth.clone()),
        };
        Ok((state, worker))
    }
}
