//! Environment configuration for the demo binary.

use eventsource_event_store::{ConfigError, PgStoreConfig};

/// Environment variable selecting the storage backend.
pub const BACKEND_VAR: &str = "EVENTSOURCE_BACKEND";

/// Where the demo keeps its events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Process memory; nothing survives the run.
    Memory,
    /// `PostgreSQL`, configured through `DATABASE_URL`.
    Postgres(PgStoreConfig),
}

impl Backend {
    /// Reads the backend selection from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unknown backend name or an invalid
    /// `PostgreSQL` configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the backend selection through `lookup`. Defaults to
    /// [`Backend::Memory`] when the variable is unset.
    ///
    /// # Errors
    ///
    /// Same as [`Backend::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw = lookup(BACKEND_VAR).unwrap_or_default();
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres(PgStoreConfig::from_lookup(lookup)?)),
            other => Err(ConfigError::Invalid {
                var: BACKEND_VAR,
                reason: format!("expected `memory` or `postgres`, got `{other}`"),
            }),
        }
    }
}
