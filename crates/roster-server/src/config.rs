//! Server configuration.
//!
//! Read once at startup from an optional `roster.toml` in the working
//! directory, then overridden by `ROSTER__<SECTION>__<KEY>` environment
//! variables (e.g. `ROSTER__AUTH__JWT_SECRET`).

use config::{Config, ConfigError, Environment, File, FileFormat};
use roster_auth::AuthConfig;
use roster_db::DbConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DbConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public base URL used in verification links.
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            base_url: "http://localhost:8080".into(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_overrides() -> Environment {
    Environment::with_prefix("ROSTER")
        .prefix_separator("__")
        .separator("__")
}

impl AppConfig {
    /// Load `roster.toml` (if present) plus environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("roster").required(false))
            .add_source(env_overrides())
            .build()?
            .try_deserialize()
    }

    /// Parse a TOML document without consulting the environment.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
