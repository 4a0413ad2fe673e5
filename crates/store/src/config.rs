//! Store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREHOUSE_DATABASE_URL` - `SQLite` connection string
//!   (falls back to `DATABASE_URL`), e.g. `sqlite://data/storehouse.db`
//!
//! ## Optional
//! - `STOREHOUSE_MAX_CONNECTIONS` - Pool size (default: 5, forced to 1 for
//!   in-memory databases)
//! - `STOREHOUSE_LIST_PER_PAGE` - Admin changelist page size (default: 10)
//! - `STOREHOUSE_LOG_JSON` - Emit JSON logs when set to `1` or `true`

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LIST_PER_PAGE: u32 = 10;
const MAX_LIST_PER_PAGE: u32 = 500;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Store configuration.
///
/// Implements `Debug` manually so the database URL (which may carry a path or
/// credentials) never reaches the logs.
#[derive(Clone)]
pub struct StoreConfig {
    /// Database connection URL.
    pub database_url: SecretString,
    /// Maximum pool connections.
    pub max_connections: u32,
    /// Rows per admin changelist page.
    pub list_per_page: u32,
    /// Whether the CLI should emit JSON logs.
    pub log_json: bool,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("list_per_page", &self.list_per_page)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a numeric
    /// variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("STOREHOUSE_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("STOREHOUSE_DATABASE_URL".to_string()))?;

        let max_connections =
            parse_u32(&lookup, "STOREHOUSE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "STOREHOUSE_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let list_per_page = parse_u32(&lookup, "STOREHOUSE_LIST_PER_PAGE", DEFAULT_LIST_PER_PAGE)?;
        if list_per_page == 0 || list_per_page > MAX_LIST_PER_PAGE {
            return Err(ConfigError::InvalidEnvVar(
                "STOREHOUSE_LIST_PER_PAGE".to_string(),
                format!("must be between 1 and {MAX_LIST_PER_PAGE}"),
            ));
        }

        let log_json = lookup("STOREHOUSE_LOG_JSON")
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"));

        Ok(Self {
            database_url,
            max_connections,
            list_per_page,
            log_json,
        })
    }

    /// Configuration for a throwaway in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            database_url: SecretString::from("sqlite::memory:"),
            max_connections: 1,
            list_per_page: DEFAULT_LIST_PER_PAGE,
            log_json: false,
        }
    }

    /// Whether the URL points at an in-memory database.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.database_url.expose_secret().contains(":memory:")
    }
}

fn parse_u32<F>(lookup: &F, key: &str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
