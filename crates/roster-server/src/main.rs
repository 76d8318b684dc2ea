//! Roster Server — Application entry point.

use roster_server::{AppConfig, AppState, router};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("auth.jwt_secret must be set (ROSTER__AUTH__JWT_SECRET)")]
    MissingJwtSecret,

    #[error("database: {0}")]
    Database(#[from] roster_db::DbError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    if config.auth.jwt_secret.is_empty() {
        return Err(StartupError::MissingJwtSecret);
    }

    let (state, notifier) = AppState::build(&config).await?;
    let app = router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Roster server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and with it every dispatcher handle) is gone; let the
    // worker drain queued notifications.
    if let Err(e) = notifier.await {
        error!(error = %e, "Notification worker panicked");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roster=info")),
        )
        .json()
        .init();

    info!("Starting Roster server...");

    if let Err(e) = run().await {
        error!(error = %e, "Roster server failed");
        std::process::exit(1);
    }

    info!("Roster server stopped.");
}
