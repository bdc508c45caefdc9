//! Event repository abstraction.
//!
//! An `EventRepository` is the record-level half of a persistence adapter:
//! it stores and lists [`EventRecord`]s and knows nothing about aggregates
//! or registries. [`crate::store::EventSourcedStore`] layers the Load/Save
//! protocol on top of any repository.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aggregate::AggregateType;
use crate::error::StoreError;

/// Stored representation of a domain event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate kind this event belongs to.
    pub aggregate_type: String,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Event type name for registry dispatch on replay.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// 1-based position within the aggregate stream.
    pub sequence_number: i64,
    /// When the store accepted the event.
    pub recorded_at: DateTime<Utc>,
}

/// Repository trait for loading and appending event records.
///
/// Implementations must:
///
/// * return the records of one `(aggregate_type, aggregate_id)` stream in
///   the order they were appended (ascending `sequence_number`), and nothing
///   from any other stream;
/// * treat records as append-only;
/// * reject an append whose `expected_version` differs from the current
///   stream length with `StoreError::ConcurrencyConflict`, writing nothing.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Load all records for an aggregate stream, ordered by sequence number.
    async fn load_events(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
    ) -> Result<Vec<EventRecord>, StoreError>;

    /// Append records to an aggregate stream with optimistic concurrency.
    /// `expected_version` is the stream length the writer last observed.
    async fn append_events(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[EventRecord],
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<R: EventRepository + ?Sized> EventRepository for Arc<R> {
    async fn load_events(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
    ) -> Result<Vec<EventRecord>, StoreError> {
        (**self).load_events(aggregate_type, aggregate_id).await
    }

    async fn append_events(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[EventRecord],
    ) -> Result<(), StoreError> {
        (**self)
            .append_events(aggregate_type, aggregate_id, expected_version, events)
            .await
    }
}
