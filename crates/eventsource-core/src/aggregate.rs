//! Aggregate root abstraction.

use std::borrow::Borrow;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use crate::any::AsAny;
use crate::event::Event;

/// Stable name of an aggregate kind, persisted with every event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregateType(&'static str);

impl AggregateType {
    /// Creates an aggregate type tag.
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

impl fmt::Display for AggregateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Borrow<str> for AggregateType {
    fn borrow(&self) -> &str {
        self.0
    }
}

/// Ordered buffer of events appended but not yet persisted.
///
/// Every concrete aggregate embeds one. Appends go through a lock scoped to
/// this instance, so several threads holding `&aggregate` may append
/// concurrently without losing or interleaving events. The buffer also
/// tracks the aggregate's version: the number of persisted events applied
/// to the instance.
#[derive(Default)]
pub struct EventBuffer {
    pending: Mutex<Vec<Arc<dyn Event>>>,
    version: i64,
}

impl EventBuffer {
    /// Creates an empty buffer at version 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event to the end of the buffer.
    pub fn append(&self, event: Arc<dyn Event>) {
        self.lock().push(event);
    }

    /// Returns the buffered events in append order.
    #[must_use]
    pub fn uncommitted(&self) -> Vec<Arc<dyn Event>> {
        self.lock().clone()
    }

    /// Number of buffered events.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no events are waiting to be persisted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of persisted events applied to the owning aggregate.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Records that one persisted event was replayed into the aggregate.
    pub fn mark_replayed(&mut self) {
        self.version += 1;
    }

    /// Drops the first `count` buffered events after they were persisted and
    /// applied, advancing the version by the same amount.
    ///
    /// Events appended after the Save read the buffer stay queued.
    #[allow(clippy::cast_possible_wrap)]
    pub fn mark_committed(&mut self, count: usize) {
        let pending = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        let count = count.min(pending.len());
        pending.drain(..count);
        self.version += count as i64;
    }

    // A push never leaves the vector half-written, so a poisoned lock is
    // still safe to use.
    fn lock(&self) -> MutexGuard<'_, Vec<Arc<dyn Event>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for EventBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBuffer")
            .field("pending", &self.pending_len())
            .field("version", &self.version)
            .finish()
    }
}

/// Trait for aggregate roots that reconstitute from event history.
pub trait Aggregate: AsAny + fmt::Debug {
    /// Returns the aggregate kind.
    fn aggregate_type(&self) -> AggregateType;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Applies an event to the domain state.
    ///
    /// This is the only place domain state changes. It must be a
    /// deterministic function of (state, event) and must leave state
    /// unchanged for event kinds the aggregate does not recognize.
    fn handle_event(&mut self, event: &dyn Event);

    /// The embedded uncommitted-event buffer.
    fn event_buffer(&self) -> &EventBuffer;

    /// Mutable access to the embedded buffer, used by stores after replay
    /// and commit.
    fn event_buffer_mut(&mut self) -> &mut EventBuffer;

    /// Buffers a new event produced by a domain method.
    fn append_event<E: Event>(&self, event: E)
    where
        Self: Sized,
    {
        self.event_buffer().append(Arc::new(event));
    }

    /// Returns the events not yet persisted, in append order.
    fn uncommitted_events(&self) -> Vec<Arc<dyn Event>> {
        self.event_buffer().uncommitted()
    }

    /// Returns the current version (persisted events applied).
    fn version(&self) -> i64 {
        self.event_buffer().version()
    }
}

impl dyn Aggregate {
    /// Returns `true` if the concrete aggregate is an `A`.
    #[must_use]
    pub fn is<A: Aggregate>(&self) -> bool {
        <dyn Aggregate as AsAny>::as_any(self).is::<A>()
    }

    /// Returns the concrete aggregate if it is an `A`.
    #[must_use]
    pub fn downcast_ref<A: Aggregate>(&self) -> Option<&A> {
        <dyn Aggregate as AsAny>::as_any(self).downcast_ref::<A>()
    }

    /// Returns the concrete aggregate mutably if it is an `A`.
    pub fn downcast_mut<A: Aggregate>(&mut self) -> Option<&mut A> {
        <dyn Aggregate as AsAny>::as_any_mut(self).downcast_mut::<A>()
    }
}
