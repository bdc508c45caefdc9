//! Type registries for aggregate and event kinds.
//!
//! A persisted event record only carries string tags. The registries map
//! those tags back to constructors so the replay engine can instantiate
//! user-defined aggregates and events without depending on them.
//!
//! Registration happens on a mutable [`RegistryBuilder`] during start-up.
//! [`RegistryBuilder::build`] freezes it into an immutable [`Registry`], and
//! [`RegistryBuilder::install`] publishes that registry process-wide. There
//! is no way to register a kind on a built registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::de::DeserializeOwned;
use tracing::{debug, error};
use uuid::Uuid;

use crate::aggregate::{Aggregate, AggregateType};
use crate::error::RegistryError;
use crate::event::{Event, EventPayload, EventType};

type AggregateFactory = Box<dyn Fn(Uuid) -> Box<dyn Aggregate> + Send + Sync>;
type EventFactory = Box<dyn Fn() -> Box<dyn Event> + Send + Sync>;
type EventDecoder =
    Box<dyn Fn(serde_json::Value) -> Result<Box<dyn Event>, serde_json::Error> + Send + Sync>;

struct EventEntry {
    factory: EventFactory,
    decode: EventDecoder,
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Mutable registration phase of a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    aggregates: HashMap<AggregateType, AggregateFactory>,
    events: HashMap<EventType, EventEntry>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an aggregate factory.
    ///
    /// The factory is invoked once with a fresh identity to discover the
    /// aggregate type it produces.
    ///
    /// # Panics
    ///
    /// Panics if the aggregate type is already registered.
    #[track_caller]
    pub fn register_aggregate<A, F>(&mut self, factory: F) -> &mut Self
    where
        A: Aggregate,
        F: Fn(Uuid) -> A + Send + Sync + 'static,
    {
        match self.try_register_aggregate(factory) {
            Ok(builder) => builder,
            Err(err) => panic!("{err}"),
        }
    }

    /// Registers an aggregate factory, reporting a duplicate tag as an error.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateAggregateType` if the aggregate type
    /// is already registered.
    pub fn try_register_aggregate<A, F>(&mut self, factory: F) -> Result<&mut Self, RegistryError>
    where
        A: Aggregate,
        F: Fn(Uuid) -> A + Send + Sync + 'static,
    {
        let aggregate_type = factory(Uuid::new_v4()).aggregate_type();
        if self.aggregates.contains_key(&aggregate_type) {
            return Err(RegistryError::DuplicateAggregateType(aggregate_type));
        }
        self.aggregates.insert(
            aggregate_type,
            Box::new(move |id| Box::new(factory(id)) as Box<dyn Aggregate>),
        );
        debug!(%aggregate_type, "registered aggregate");
        Ok(self)
    }

    /// Registers an event factory producing the zero value of an event kind.
    ///
    /// The factory is invoked once to discover the event type it produces.
    ///
    /// # Panics
    ///
    /// Panics if the event type is already registered.
    #[track_caller]
    pub fn register_event<E, F>(&mut self, factory: F) -> &mut Self
    where
        E: Event + DeserializeOwned,
        F: Fn() -> E + Send + Sync + 'static,
    {
        match self.try_register_event(factory) {
            Ok(builder) => builder,
            Err(err) => panic!("{err}"),
        }
    }

    /// Registers an event factory, reporting a duplicate tag as an error.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateEventType` if the event type is
    /// already registered.
    pub fn try_register_event<E, F>(&mut self, factory: F) -> Result<&mut Self, RegistryError>
    where
        E: Event + DeserializeOwned,
        F: Fn() -> E + Send + Sync + 'static,
    {
        let event_type = factory().event_type();
        if self.events.contains_key(&event_type) {
            return Err(RegistryError::DuplicateEventType(event_type));
        }
        let factory = Arc::new(factory);
        let decode_base = Arc::clone(&factory);
        self.events.insert(
            event_type,
            EventEntry {
                factory: Box::new(move || Box::new((*factory)()) as Box<dyn Event>),
                decode: Box::new(move |payload: serde_json::Value| {
                    decode_into((*decode_base)(), payload)
                }),
            },
        );
        debug!(%event_type, "registered event");
        Ok(self)
    }

    /// Freezes the registrations into an immutable registry.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            inner: Arc::new(Inner {
                aggregates: self.aggregates,
                events: self.events,
            }),
        }
    }

    /// Freezes the registrations and publishes them as the process-wide
    /// registry returned by [`global`].
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::AlreadyInstalled` if a registry was installed
    /// before; the existing registry stays in place.
    pub fn install(self) -> Result<&'static Registry, RegistryError> {
        let registry = self.build();
        let mut installed = false;
        let global = GLOBAL.get_or_init(|| {
            installed = true;
            registry
        });
        if installed {
            Ok(global)
        } else {
            Err(RegistryError::AlreadyInstalled)
        }
    }
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("aggregates", &sorted(self.aggregates.keys()))
            .field("events", &sorted(self.events.keys()))
            .finish()
    }
}

/// Decodes `payload` into `base`: fields present in the payload replace the
/// factory's values, absent ones keep them.
fn decode_into<E>(base: E, payload: serde_json::Value) -> Result<Box<dyn Event>, serde_json::Error>
where
    E: Event + DeserializeOwned,
{
    let merged = match (EventPayload::to_payload(&base)?, payload) {
        (serde_json::Value::Object(mut fields), serde_json::Value::Object(stored)) => {
            fields.extend(stored);
            serde_json::Value::Object(fields)
        }
        (_, payload) => payload,
    };
    let event: E = serde_json::from_value(merged)?;
    Ok(Box::new(event))
}

fn sorted<'a, T: Copy + Ord + 'a>(keys: impl Iterator<Item = &'a T>) -> Vec<T> {
    let mut keys: Vec<T> = keys.copied().collect();
    keys.sort_unstable();
    keys
}

struct Inner {
    aggregates: HashMap<AggregateType, AggregateFactory>,
    events: HashMap<EventType, EventEntry>,
}

/// Immutable map from type tags to aggregate and event constructors.
///
/// Cheap to clone; clones share the same maps.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Builds an empty aggregate of the given kind.
    ///
    /// # Panics
    ///
    /// Panics if the aggregate type is not registered: the running process
    /// does not understand a kind its callers or its data refer to.
    #[must_use]
    #[track_caller]
    pub fn build_aggregate(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
    ) -> Box<dyn Aggregate> {
        match self.try_build_aggregate(aggregate_type.as_str(), aggregate_id) {
            Ok(aggregate) => aggregate,
            Err(err) => fatal(&err),
        }
    }

    /// Builds an empty aggregate of the given kind.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownAggregateType` if the tag is not
    /// registered.
    pub fn try_build_aggregate(
        &self,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<Box<dyn Aggregate>, RegistryError> {
        self.inner
            .aggregates
            .get(aggregate_type)
            .map(|factory| factory(aggregate_id))
            .ok_or_else(|| RegistryError::UnknownAggregateType(aggregate_type.to_owned()))
    }

    /// Builds the zero value of the given event kind.
    ///
    /// # Panics
    ///
    /// Panics if the event type is not registered.
    #[must_use]
    #[track_caller]
    pub fn build_event(&self, event_type: &str) -> Box<dyn Event> {
        match self.try_build_event(event_type) {
            Ok(event) => event,
            Err(err) => fatal(&err),
        }
    }

    /// Builds the zero value of the given event kind.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownEventType` if the tag is not
    /// registered.
    pub fn try_build_event(&self, event_type: &str) -> Result<Box<dyn Event>, RegistryError> {
        self.inner
            .events
            .get(event_type)
            .map(|entry| (entry.factory)())
            .ok_or_else(|| RegistryError::UnknownEventType(event_type.to_owned()))
    }

    /// Instantiates the event kind named by `event_type` from a stored payload.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Decode` if the payload does not match the
    /// registered event kind.
    ///
    /// # Panics
    ///
    /// Panics if the event type is not registered.
    #[track_caller]
    pub fn decode_event(
        &self,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<Box<dyn Event>, RegistryError> {
        match self.try_decode_event(event_type, payload) {
            Err(err @ RegistryError::UnknownEventType(_)) => fatal(&err),
            result => result,
        }
    }

    /// Instantiates the event kind named by `event_type` from a stored payload.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownEventType` if the tag is not registered
    /// and `RegistryError::Decode` if the payload does not match.
    pub fn try_decode_event(
        &self,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<Box<dyn Event>, RegistryError> {
        let entry = self
            .inner
            .events
            .get(event_type)
            .ok_or_else(|| RegistryError::UnknownEventType(event_type.to_owned()))?;
        (entry.decode)(payload).map_err(|source| RegistryError::Decode {
            event_type: event_type.to_owned(),
            source,
        })
    }

    /// Returns `true` if the aggregate type is registered.
    #[must_use]
    pub fn contains_aggregate(&self, aggregate_type: &str) -> bool {
        self.inner.aggregates.contains_key(aggregate_type)
    }

    /// Returns `true` if the event type is registered.
    #[must_use]
    pub fn contains_event(&self, event_type: &str) -> bool {
        self.inner.events.contains_key(event_type)
    }

    /// Registered aggregate types, sorted.
    #[must_use]
    pub fn aggregate_types(&self) -> Vec<AggregateType> {
        sorted(self.inner.aggregates.keys())
    }

    /// Registered event types, sorted.
    #[must_use]
    pub fn event_types(&self) -> Vec<EventType> {
        sorted(self.inner.events.keys())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("aggregates", &self.aggregate_types())
            .field("events", &self.event_types())
            .finish()
    }
}

/// Returns the process-wide registry.
///
/// # Panics
///
/// Panics if no registry has been installed with [`RegistryBuilder::install`].
#[must_use]
#[track_caller]
pub fn global() -> &'static Registry {
    match GLOBAL.get() {
        Some(registry) => registry,
        None => panic!("process-wide registry used before RegistryBuilder::install"),
    }
}

/// Returns the process-wide registry if one has been installed.
#[must_use]
pub fn try_global() -> Option<&'static Registry> {
    GLOBAL.get()
}

#[track_caller]
fn fatal(err: &RegistryError) -> ! {
    error!(error = %err, "registry misconfiguration");
    panic!("{err}")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::testing::{
        DEPOSITED, Deposited, LEDGER, Ledger, NOTED, Noted, WITHDRAWN, ledger_registry,
    };

    #[test]
    fn test_build_aggregate_returns_empty_instance_with_identity() {
        // Arrange
        let registry = ledger_registry().build();
        let id = Uuid::new_v4();

        // Act
        let aggregate = registry.build_aggregate(LEDGER, id);

        // Assert
        assert_eq!(aggregate.aggregate_type(), LEDGER);
        assert_eq!(aggregate.aggregate_id(), id);
        assert_eq!(aggregate.version(), 0);
        let ledger = aggregate.downcast_ref::<Ledger>().unwrap();
        assert_eq!(ledger.balance, 0);
        assert!(ledger.uncommitted_events().is_empty());
    }

    #[test]
    fn test_build_event_returns_zero_value() {
        let registry = ledger_registry().build();

        let event = registry.build_event("Deposited");

        assert_eq!(event.event_type(), DEPOSITED);
        assert_eq!(event.downcast_ref::<Deposited>(), Some(&Deposited { amount: 0 }));
    }

    #[test]
    #[should_panic(expected = "aggregate type already registered: Ledger")]
    fn test_register_aggregate_twice_panics() {
        let mut builder = ledger_registry();
        builder.register_aggregate(Ledger::new);
    }

    #[test]
    #[should_panic(expected = "event type already registered: Deposited")]
    fn test_register_event_twice_panics() {
        let mut builder = ledger_registry();
        builder.register_event(Deposited::default);
    }

    #[test]
    fn test_try_register_duplicate_returns_error() {
        let mut builder = ledger_registry();

        let aggregate_result = builder.try_register_aggregate(Ledger::new).map(|_| ());
        let event_result = builder.try_register_event(Deposited::default).map(|_| ());

        assert!(matches!(
            aggregate_result,
            Err(RegistryError::DuplicateAggregateType(t)) if t == LEDGER
        ));
        assert!(matches!(
            event_result,
            Err(RegistryError::DuplicateEventType(t)) if t == DEPOSITED
        ));
    }

    #[test]
    #[should_panic(expected = "aggregate type not registered: Account")]
    fn test_build_unknown_aggregate_panics() {
        let registry = ledger_registry().build();
        let _ = registry.build_aggregate(AggregateType::new("Account"), Uuid::new_v4());
    }

    #[test]
    #[should_panic(expected = "event type not registered: Refunded")]
    fn test_build_unknown_event_panics() {
        let registry = ledger_registry().build();
        let _ = registry.build_event("Refunded");
    }

    #[test]
    #[should_panic(expected = "event type not registered: Refunded")]
    fn test_decode_unknown_event_panics() {
        let registry = ledger_registry().build();
        let _ = registry.decode_event("Refunded", serde_json::json!({}));
    }

    #[test]
    fn test_try_build_unknown_tags_return_errors() {
        let registry = RegistryBuilder::new().build();

        let aggregate = registry.try_build_aggregate("Ledger", Uuid::new_v4());
        let event = registry.try_build_event("Deposited");

        assert!(matches!(aggregate, Err(RegistryError::UnknownAggregateType(t)) if t == "Ledger"));
        assert!(matches!(event, Err(RegistryError::UnknownEventType(t)) if t == "Deposited"));
    }

    #[test]
    fn test_decode_event_populates_registered_kind() {
        let registry = ledger_registry().build();

        let event = registry
            .decode_event("Withdrawn", serde_json::json!({"amount": 12}))
            .unwrap();

        assert_eq!(event.event_type(), WITHDRAWN);
        assert_eq!(
            event.downcast_ref::<crate::testing::Withdrawn>().map(|w| w.amount),
            Some(12)
        );
    }

    #[test]
    fn test_decode_event_starts_from_factory_value() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut builder = RegistryBuilder::new();
        builder.register_event(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Noted {
                text: "unspecified".to_owned(),
            }
        });
        let registry = builder.build();

        // Act
        let kept = registry.decode_event("Noted", serde_json::json!({})).unwrap();
        let replaced = registry
            .decode_event("Noted", serde_json::json!({"text": "audit"}))
            .unwrap();

        // Assert
        assert_eq!(
            kept.downcast_ref::<Noted>().map(|n| n.text.as_str()),
            Some("unspecified")
        );
        assert_eq!(
            replaced.downcast_ref::<Noted>().map(|n| n.text.as_str()),
            Some("audit")
        );
        // One call to discover the tag, one per decode.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_decode_event_reports_malformed_payload() {
        let registry = ledger_registry().build();

        let result = registry.decode_event("Deposited", serde_json::json!({"amount": "lots"}));

        match result {
            Err(RegistryError::Decode { event_type, .. }) => assert_eq!(event_type, "Deposited"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn test_introspection_lists_sorted_tags() {
        let registry = ledger_registry().build();

        assert_eq!(registry.aggregate_types(), vec![LEDGER]);
        assert_eq!(registry.event_types(), vec![DEPOSITED, NOTED, WITHDRAWN]);
        assert!(registry.contains_aggregate("Ledger"));
        assert!(registry.contains_event("Noted"));
        assert!(!registry.contains_event("Refunded"));
    }

    #[test]
    fn test_clones_share_registrations() {
        let registry = ledger_registry().build();

        let clone = registry.clone();

        assert_eq!(clone.event_types(), registry.event_types());
    }

    // The only test in this crate that touches the process-wide registry.
    #[test]
    fn test_install_publishes_once() {
        // Act
        let first = ledger_registry().install().map(Registry::event_types);
        let second = RegistryBuilder::new().install().map(|_| ());

        // Assert
        assert_eq!(first.unwrap(), vec![DEPOSITED, NOTED, WITHDRAWN]);
        assert!(matches!(second, Err(RegistryError::AlreadyInstalled)));
        assert!(global().contains_aggregate("Ledger"));
        assert!(try_global().is_some());
    }
}
