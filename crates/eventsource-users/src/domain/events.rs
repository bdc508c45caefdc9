//! Domain events for user accounts.

use eventsource_core::event::{Event, EventType};
use serde::{Deserialize, Serialize};

/// Tag of [`UserRegistered`].
pub const USER_REGISTERED: EventType = EventType::new("UserRegistered");
/// Tag of [`UserVerified`].
pub const USER_VERIFIED: EventType = EventType::new("UserVerified");
/// Tag of [`UserDisabled`].
pub const USER_DISABLED: EventType = EventType::new("UserDisabled");

/// Emitted when a user signs up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistered {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Password as supplied by the caller.
    pub password: String,
}

impl Event for UserRegistered {
    fn event_type(&self) -> EventType {
        USER_REGISTERED
    }
}

/// Emitted when a user confirms their email. Carries no data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserVerified {}

impl Event for UserVerified {
    fn event_type(&self) -> EventType {
        USER_VERIFIED
    }
}

/// Emitted when a user account is switched off.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDisabled {
    /// Free-form reason, empty if none was given.
    #[serde(default)]
    pub reason: String,
}

impl Event for UserDisabled {
    fn event_type(&self) -> EventType {
        USER_DISABLED
    }
}
