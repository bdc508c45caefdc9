//! Domain event abstractions.

use std::borrow::Borrow;
use std::fmt;

use serde::Serialize;

use crate::any::AsAny;

/// Stable name of an event kind, persisted with every event record.
///
/// Declared once per kind as a constant, e.g.
/// `pub const USER_REGISTERED: EventType = EventType::new("UserRegistered");`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventType(&'static str);

impl EventType {
    /// Creates an event type tag.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Borrow<str> for EventType {
    fn borrow(&self) -> &str {
        self.0
    }
}

/// Serializes an event into its persisted JSON payload.
///
/// Blanket-implemented for every `Serialize` type.
pub trait EventPayload {
    /// Serializes the event payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the payload cannot be represented as
    /// JSON (e.g. a map with non-string keys).
    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error>;
}

impl<T: Serialize> EventPayload for T {
    fn to_payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// An immutable fact that happened to an aggregate.
///
/// Implementations are plain data carriers; the only required behavior is
/// reporting the event kind.
pub trait Event: AsAny + EventPayload + fmt::Debug {
    /// Returns the event type tag (used for registry dispatch on replay).
    fn event_type(&self) -> EventType;
}

impl dyn Event {
    /// Returns `true` if the concrete event is an `E`.
    #[must_use]
    pub fn is<E: Event>(&self) -> bool {
        <dyn Event as AsAny>::as_any(self).is::<E>()
    }

    /// Returns the concrete event if it is an `E`.
    #[must_use]
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        <dyn Event as AsAny>::as_any(self).downcast_ref::<E>()
    }
}
