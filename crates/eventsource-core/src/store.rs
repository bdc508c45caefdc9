//! Aggregate store protocol and the replay engine behind it.
//!
//! `AggregateStore` is the boundary between domain code and persistence:
//!
//! * **Load** builds an empty aggregate from the registry, fetches the
//!   stream's records in persisted order, decodes each payload into its
//!   registered event kind and replays it through `handle_event`. A stream
//!   with no records yields the freshly built aggregate. Any retrieval or
//!   decode failure aborts the load; a partially hydrated aggregate is never
//!   returned.
//! * **Save** persists the uncommitted events as one batch, and only once
//!   the repository has accepted the whole batch applies them to the
//!   in-memory aggregate and removes them from its buffer. On failure the
//!   aggregate is left exactly as it was, so the caller may retry.
//!
//! Cancellation follows the caller's context: dropping a Load or Save
//! future (timeout, `select!`, task abort) stops it at the next await point.
//! Save touches memory only after its last await, so a dropped Save never
//! leaves a half-applied aggregate.

use std::any::type_name;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::aggregate::{Aggregate, AggregateType};
use crate::any::AsAny;
use crate::clock::{Clock, SystemClock};
use crate::error::StoreError;
use crate::event::Event;
use crate::registry::{self, Registry};
use crate::repository::{EventRecord, EventRepository};

/// Loads and saves whole aggregates.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// Rebuilds the current state of an aggregate by replaying its history.
    async fn load(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
    ) -> Result<Box<dyn Aggregate>, StoreError>;

    /// Persists the aggregate's uncommitted events, then applies them.
    async fn save(&self, aggregate: &mut dyn Aggregate) -> Result<(), StoreError>;
}

/// Typed helpers over any [`AggregateStore`].
#[async_trait]
pub trait AggregateStoreExt: AggregateStore {
    /// Loads an aggregate and downcasts it to its concrete type.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::TypeMismatch` if the registry builds a different
    /// type for `aggregate_type`, plus every error of [`AggregateStore::load`].
    async fn load_as<A: Aggregate>(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
    ) -> Result<Box<A>, StoreError> {
        let aggregate = self.load(aggregate_type, aggregate_id).await?;
        let loaded_type = aggregate.aggregate_type();
        <dyn Aggregate as AsAny>::into_any(aggregate)
            .downcast::<A>()
            .map_err(|_| StoreError::TypeMismatch {
                aggregate_type: loaded_type,
                expected: type_name::<A>(),
            })
    }
}

impl<S: AggregateStore + ?Sized> AggregateStoreExt for S {}

/// `AggregateStore` implemented on top of an [`EventRepository`].
///
/// Holds the registry used for replay and the clock used to stamp records.
pub struct EventSourcedStore<R> {
    repository: R,
    registry: Registry,
    clock: Arc<dyn Clock>,
}

impl<R: EventRepository> EventSourcedStore<R> {
    /// Creates a store over `repository`, replaying with `registry`.
    #[must_use]
    pub fn new(repository: R, registry: Registry, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            registry,
            clock,
        }
    }

    /// Creates a store that replays with the process-wide registry and
    /// stamps records with the system clock.
    ///
    /// # Panics
    ///
    /// Panics if no process-wide registry has been installed.
    #[must_use]
    pub fn with_global_registry(repository: R) -> Self {
        Self::new(repository, registry::global().clone(), Arc::new(SystemClock))
    }

    /// The underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// The registry used for replay.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl<R> std::fmt::Debug for EventSourcedStore<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSourcedStore")
            .field("repository", &type_name::<R>())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R: EventRepository> AggregateStore for EventSourcedStore<R> {
    #[instrument(skip_all, fields(aggregate_type = %aggregate_type, aggregate_id = %aggregate_id))]
    async fn load(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
    ) -> Result<Box<dyn Aggregate>, StoreError> {
        let mut aggregate = self.registry.build_aggregate(aggregate_type, aggregate_id);

        let records = self
            .repository
            .load_events(aggregate_type, aggregate_id)
            .await?;

        for record in records {
            let event = self.registry.decode_event(&record.event_type, record.payload)?;
            aggregate.handle_event(event.as_ref());
            aggregate.event_buffer_mut().mark_replayed();
        }

        debug!(version = aggregate.version(), "aggregate hydrated");
        Ok(aggregate)
    }

    #[instrument(
        skip_all,
        fields(
            aggregate_type = %aggregate.aggregate_type(),
            aggregate_id = %aggregate.aggregate_id(),
        )
    )]
    async fn save(&self, aggregate: &mut dyn Aggregate) -> Result<(), StoreError> {
        let pending = aggregate.uncommitted_events();
        if pending.is_empty() {
            debug!("no uncommitted events");
            return Ok(());
        }

        let expected_version = aggregate.version();
        let recorded_at = self.clock.now();
        let records = pending
            .iter()
            .zip(expected_version + 1..)
            .map(|(event, sequence_number)| {
                to_record(&*aggregate, event.as_ref(), sequence_number, recorded_at)
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.repository
            .append_events(
                aggregate.aggregate_type(),
                aggregate.aggregate_id(),
                expected_version,
                &records,
            )
            .await?;

        for event in &pending {
            aggregate.handle_event(event.as_ref());
        }
        aggregate.event_buffer_mut().mark_committed(pending.len());

        info!(
            events = pending.len(),
            version = aggregate.version(),
            "events committed"
        );
        Ok(())
    }
}

fn to_record(
    aggregate: &dyn Aggregate,
    event: &dyn Event,
    sequence_number: i64,
    recorded_at: DateTime<Utc>,
) -> Result<EventRecord, StoreError> {
    let event_type = event.event_type();
    let payload = event
        .to_payload()
        .map_err(|source| StoreError::Encode { event_type, source })?;
    Ok(EventRecord {
        event_id: Uuid::now_v7(),
        aggregate_type: aggregate.aggregate_type().as_str().to_owned(),
        aggregate_id: aggregate.aggregate_id(),
        event_type: event_type.as_str().to_owned(),
        payload,
        sequence_number,
        recorded_at,
    })
}
