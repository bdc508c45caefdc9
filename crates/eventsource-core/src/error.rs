//! Registry and store error types.

use thiserror::Error;
use uuid::Uuid;

use crate::aggregate::AggregateType;
use crate::event::EventType;

/// Errors raised while registering or resolving aggregate and event kinds.
///
/// Duplicate and unknown tags are configuration errors: the panicking
/// registry methods treat them as fatal, the `try_` variants report them.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An aggregate kind was registered twice.
    #[error("aggregate type already registered: {0}")]
    DuplicateAggregateType(AggregateType),

    /// An event kind was registered twice.
    #[error("event type already registered: {0}")]
    DuplicateEventType(EventType),

    /// No factory is registered for the aggregate type tag.
    #[error("aggregate type not registered: {0}")]
    UnknownAggregateType(String),

    /// No factory is registered for the event type tag.
    #[error("event type not registered: {0}")]
    UnknownEventType(String),

    /// A stored payload could not be decoded into its registered event kind.
    #[error("failed to decode {event_type} payload: {source}")]
    Decode {
        /// The event type tag of the payload.
        event_type: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A process-wide registry has already been installed.
    #[error("process-wide registry is already installed")]
    AlreadyInstalled,
}

/// Errors surfaced by `AggregateStore` and `EventRepository` operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic concurrency conflict: another writer appended to the
    /// aggregate stream since it was loaded.
    #[error(
        "concurrency conflict on {aggregate_type} {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The aggregate kind.
        aggregate_type: String,
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The version the writer expected.
        expected: i64,
        /// The version found in the store.
        actual: i64,
    },

    /// A persisted payload could not be decoded during Load.
    #[error("failed to decode {event_type} event: {source}")]
    Decode {
        /// The event type tag of the record.
        event_type: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An event could not be serialized during Save.
    #[error("failed to encode {event_type} event: {source}")]
    Encode {
        /// The event type tag of the event.
        event_type: EventType,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The loaded aggregate is not of the requested concrete type.
    #[error("aggregate {aggregate_type} is not a {expected}")]
    TypeMismatch {
        /// The aggregate type tag that was loaded.
        aggregate_type: AggregateType,
        /// The Rust type the caller asked for.
        expected: &'static str,
    },

    /// A registry lookup failed.
    #[error(transparent)]
    Registry(RegistryError),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl From<RegistryError> for StoreError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Decode { event_type, source } => Self::Decode { event_type, source },
            other => Self::Registry(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_decode_error_maps_to_store_decode() {
        let source = serde_json::from_str::<u8>("\"x\"").unwrap_err();
        let err = RegistryError::Decode {
            event_type: "Deposited".to_owned(),
            source,
        };

        match StoreError::from(err) {
            StoreError::Decode { event_type, .. } => assert_eq!(event_type, "Deposited"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }

    #[test]
    fn test_other_registry_errors_are_wrapped() {
        let err = RegistryError::UnknownEventType("Ghost".to_owned());

        let store_err = StoreError::from(err);

        assert!(matches!(
            store_err,
            StoreError::Registry(RegistryError::UnknownEventType(ref tag)) if tag == "Ghost"
        ));
        assert_eq!(store_err.to_string(), "event type not registered: Ghost");
    }

    #[test]
    fn test_concurrency_conflict_message() {
        let id = Uuid::nil();
        let err = StoreError::ConcurrencyConflict {
            aggregate_type: "User".to_owned(),
            aggregate_id: id,
            expected: 1,
            actual: 3,
        };

        assert_eq!(
            err.to_string(),
            format!("concurrency conflict on User {id}: expected version 1, found 3")
        );
    }
}
