//! Command handlers for user accounts.
//!
//! Each handler loads the aggregate through an `AggregateStore`, runs the
//! domain method and saves the buffered events.

use eventsource_core::store::{AggregateStore, AggregateStoreExt};
use tracing::{info, instrument};

use crate::domain::aggregates::{USER_AGGREGATE, User};
use crate::domain::commands::{DisableUser, RegisterUser, VerifyUser};
use crate::error::UserError;

/// Handles the `RegisterUser` command.
///
/// Returns the saved user, with the registration already applied.
///
/// # Errors
///
/// Returns `UserError` if validation fails, the user is already registered,
/// or loading or saving fails.
#[instrument(skip_all, fields(user_id = %command.user_id))]
pub async fn handle_register_user(
    command: &RegisterUser,
    store: &dyn AggregateStore,
) -> Result<Box<User>, UserError> {
    let mut user = store
        .load_as::<User>(USER_AGGREGATE, command.user_id)
        .await?;

    user.register(&command.name, &command.email, &command.password)?;
    store.save(&mut *user).await?;

    info!("user registered");
    Ok(user)
}

/// Handles the `VerifyUser` command.
///
/// # Errors
///
/// Returns `UserError` if the user is not registered, not awaiting
/// verification, or loading or saving fails.
#[instrument(skip_all, fields(user_id = %command.user_id))]
pub async fn handle_verify_user(
    command: &VerifyUser,
    store: &dyn AggregateStore,
) -> Result<Box<User>, UserError> {
    let mut user = store
        .load_as::<User>(USER_AGGREGATE, command.user_id)
        .await?;

    user.verify()?;
    store.save(&mut *user).await?;

    info!("user verified");
    Ok(user)
}

/// Handles the `DisableUser` command.
///
/// # Errors
///
/// Returns `UserError` if the user is not registered, already disabled, or
/// loading or saving fails.
#[instrument(skip_all, fields(user_id = %command.user_id))]
pub async fn handle_disable_user(
    command: &DisableUser,
    store: &dyn AggregateStore,
) -> Result<Box<User>, UserError> {
    let mut user = store
        .load_as::<User>(USER_AGGREGATE, command.user_id)
        .await?;

    user.disable(&command.reason)?;
    store.save(&mut *user).await?;

    info!("user disabled");
    Ok(user)
}
