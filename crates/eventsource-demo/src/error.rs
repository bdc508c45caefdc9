//! Demo error types.

use eventsource_core::error::{RegistryError, StoreError};
use eventsource_event_store::ConfigError;
use eventsource_users::error::UserError;
use thiserror::Error;

/// Startup and runtime errors for the demo binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The process-wide registry could not be installed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Loading or saving an aggregate failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A user command was rejected.
    #[error("user command failed: {0}")]
    User(#[from] UserError),
}
