//! Roster Server — HTTP surface over the account lifecycle service.

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/users/",
            post(handlers::create_user).get(handlers::list_users),
        )
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route(
            "/users/{id}/set-professional/{flag}",
            put(handlers::set_professional),
        )
        .route("/users/{id}/unlock", put(handlers::unlock_user))
        .route("/register/", post(handlers::register))
        .route("/login/", post(handlers::login))
        .route("/verify-email/{id}/{token}", get(handlers::verify_email))
        .route("/update-profile/", put(handlers::update_profile))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
