//! User accounts as an event-sourced aggregate.
//!
//! A user is registered with a name, email and password, starts out
//! unverified, becomes active once verified and can be disabled.

pub mod application;
pub mod domain;
pub mod error;

use eventsource_core::registry::RegistryBuilder;

use crate::domain::aggregates::User;
use crate::domain::events::{UserDisabled, UserRegistered, UserVerified};

/// Registers the `User` aggregate and its events.
///
/// # Panics
///
/// Panics if any of these kinds is already registered on `builder`.
pub fn register(builder: &mut RegistryBuilder) -> &mut RegistryBuilder {
    builder
        .register_aggregate(User::new)
        .register_event(UserRegistered::default)
        .register_event(UserVerified::default)
        .register_event(UserDisabled::default)
}
