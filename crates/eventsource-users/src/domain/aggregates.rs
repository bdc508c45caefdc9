//! Aggregate root for user accounts.

use std::fmt;

use eventsource_core::aggregate::{Aggregate, AggregateType, EventBuffer};
use eventsource_core::event::Event;
use uuid::Uuid;

use crate::domain::events::{UserDisabled, UserRegistered, UserVerified};
use crate::error::UserError;

/// Tag of the [`User`] aggregate.
pub const USER_AGGREGATE: AggregateType = AggregateType::new("User");

/// Lifecycle status of a user account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserStatus {
    /// Registered (or not yet registered) and awaiting verification.
    #[default]
    Unverified,
    /// Verified and allowed to sign in.
    Active,
    /// Switched off.
    Disabled,
}

impl UserStatus {
    /// Returns the status name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unverified => "Unverified",
            Self::Active => "Active",
            Self::Disabled => "Disabled",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The aggregate root for a user account.
///
/// Domain methods validate against the state rebuilt from persisted events
/// and only buffer events; the state itself changes when the store applies
/// them on Save.
#[derive(Debug)]
pub struct User {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Password.
    pub password: String,
    /// Lifecycle status.
    pub status: UserStatus,
    registered: bool,
    events: EventBuffer,
}

impl User {
    /// Creates an empty, unregistered user.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            name: String::new(),
            email: String::new(),
            password: String::new(),
            status: UserStatus::Unverified,
            registered: false,
            events: EventBuffer::new(),
        }
    }

    /// Whether a registration has been applied.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Buffers a `UserRegistered` event.
    ///
    /// # Errors
    ///
    /// Returns `UserError::AlreadyRegistered` for a registered user and
    /// `UserError::Validation` if a field is blank or the email has no `@`.
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<(), UserError> {
        if self.registered {
            return Err(UserError::AlreadyRegistered(self.id));
        }
        if name.trim().is_empty() {
            return Err(UserError::Validation("user name must not be empty".into()));
        }
        if !email.contains('@') {
            return Err(UserError::Validation(format!(
                "email address is invalid: {email:?}"
            )));
        }
        if password.is_empty() {
            return Err(UserError::Validation("password must not be empty".into()));
        }

        self.append_event(UserRegistered {
            name: name.trim().to_owned(),
            email: email.trim().to_owned(),
            password: password.to_owned(),
        });
        Ok(())
    }

    /// Buffers a `UserVerified` event.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotRegistered` for an unregistered user and
    /// `UserError::InvalidStatus` unless the user is unverified.
    pub fn verify(&self) -> Result<(), UserError> {
        self.ensure_status(UserStatus::Unverified, "verify")?;
        self.append_event(UserVerified {});
        Ok(())
    }

    /// Buffers a `UserDisabled` event.
    ///
    /// # Errors
    ///
    /// Returns `UserError::NotRegistered` for an unregistered user and
    /// `UserError::InvalidStatus` if the user is already disabled.
    pub fn disable(&self, reason: &str) -> Result<(), UserError> {
        if !self.registered {
            return Err(UserError::NotRegistered(self.id));
        }
        if self.status == UserStatus::Disabled {
            return Err(self.invalid_status("disable"));
        }
        self.append_event(UserDisabled {
            reason: reason.trim().to_owned(),
        });
        Ok(())
    }

    fn ensure_status(&self, expected: UserStatus, action: &'static str) -> Result<(), UserError> {
        if !self.registered {
            return Err(UserError::NotRegistered(self.id));
        }
        if self.status != expected {
            return Err(self.invalid_status(action));
        }
        Ok(())
    }

    fn invalid_status(&self, action: &'static str) -> UserError {
        UserError::InvalidStatus {
            user_id: self.id,
            status: self.status,
            action,
        }
    }
}

impl Aggregate for User {
    fn aggregate_type(&self) -> AggregateType {
        USER_AGGREGATE
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn handle_event(&mut self, event: &dyn Event) {
        if let Some(registered) = event.downcast_ref::<UserRegistered>() {
            self.name.clone_from(&registered.name);
            self.email.clone_from(&registered.email);
            self.password.clone_from(&registered.password);
            self.registered = true;
        } else if event.is::<UserVerified>() {
            self.status = UserStatus::Active;
        } else if event.is::<UserDisabled>() {
            self.status = UserStatus::Disabled;
        }
    }

    fn event_buffer(&self) -> &EventBuffer {
        &self.events
    }

    fn event_buffer_mut(&mut self) -> &mut EventBuffer {
        &mut self.events
    }
}
