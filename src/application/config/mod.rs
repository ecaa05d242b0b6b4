pub mod app;
pub mod auth;
pub mod database;
pub mod invites;
pub mod logging;
pub mod mail;
pub mod server;

use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Configuration failures. Fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub database: database::DatabaseConfig,
    pub auth: auth::AuthConfig,
    pub invites: invites::InviteConfig,
    pub mail: Option<mail::MailConfig>,
    pub app: app::AppConfig,
    pub logging: logging::LoggingConfig,
}

impl Config {
    /// Load `.env` (if present) and then read the process environment.
    pub fn load() -> ConfigResult<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_env()
    }

    pub fn from_env() -> ConfigResult<Self> {
        let server = server::ServerConfig::from_env()?;
        let app = app::AppConfig::from_env(server.port);

        Ok(Self {
            database: database::DatabaseConfig::from_env()?,
            auth: auth::AuthConfig::from_env()?,
            invites: invites::InviteConfig::from_env()?,
            mail: mail::MailConfig::from_env()?,
            logging: logging::LoggingConfig::from_env(),
            server,
            app,
        })
    }
}

/// Read a required, non-empty variable.
pub(crate) fn required(var: &'static str) -> ConfigResult<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ConfigError::Missing(var)),
    }
}

/// Read an optional variable, treating blank values as unset.
pub(crate) fn optional(var: &'static str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an optional variable, falling back to `default` when unset.
pub(crate) fn parsed_or<T: FromStr>(var: &'static str, default: T) -> ConfigResult<T> {
    match optional(var) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
