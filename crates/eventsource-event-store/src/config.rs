//! Connection settings for the `PostgreSQL` repository.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Environment variable holding the `PostgreSQL` connection string.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
/// Environment variable overriding the pool size.
pub const MAX_CONNECTIONS_VAR: &str = "DATABASE_MAX_CONNECTIONS";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// A required setting is missing or invalid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    /// An environment variable is set to an unusable value.
    #[error("{var} is invalid: {reason}")]
    Invalid {
        /// The offending variable.
        var: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Settings used to open the `PostgreSQL` pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgStoreConfig {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl PgStoreConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `DATABASE_URL` is unset and
    /// `ConfigError::Invalid` if `DATABASE_MAX_CONNECTIONS` is not a positive
    /// integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    ///
    /// # Errors
    ///
    /// Same as [`PgStoreConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup(DATABASE_URL_VAR)
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing(DATABASE_URL_VAR))?;

        let max_connections = match lookup(MAX_CONNECTIONS_VAR) {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: MAX_CONNECTIONS_VAR,
                        reason: "must be greater than zero".to_owned(),
                    });
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: MAX_CONNECTIONS_VAR,
                        reason: e.to_string(),
                    });
                }
            },
        };

        Ok(Self {
            database_url,
            max_connections,
        })
    }

    /// Opens a connection pool with these settings.
    ///
    /// # Errors
    ///
    /// Returns the sqlx error if the database cannot be reached.
    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await
    }
}
