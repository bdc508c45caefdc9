//! Errors for user commands.

use eventsource_core::error::StoreError;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::UserStatus;

/// Errors returned by user domain methods and command handlers.
#[derive(Debug, Error)]
pub enum UserError {
    /// Command input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The user has already been registered.
    #[error("user {0} is already registered")]
    AlreadyRegistered(Uuid),

    /// The user has no registration in its history.
    #[error("user {0} is not registered")]
    NotRegistered(Uuid),

    /// The command is not allowed in the user's current status.
    #[error("cannot {action} user {user_id} while {status}")]
    InvalidStatus {
        /// The user identifier.
        user_id: Uuid,
        /// The status that rejected the command.
        status: UserStatus,
        /// What was attempted.
        action: &'static str,
    },

    /// Loading or saving the aggregate failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
