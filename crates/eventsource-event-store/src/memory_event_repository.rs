//! In-memory implementation of the `EventRepository` trait.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use eventsource_core::aggregate::AggregateType;
use eventsource_core::error::StoreError;
use eventsource_core::repository::{EventRecord, EventRepository};

type StreamKey = (String, Uuid);

/// Event repository that keeps every stream in process memory.
///
/// Suitable for tests and single-process tools. A batch is checked and
/// appended under one write lock, so it lands completely or not at all.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: RwLock<HashMap<StreamKey, Vec<EventRecord>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all streams.
    pub fn len(&self) -> usize {
        self.streams
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    /// Whether no record has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let streams = self.streams.read().unwrap_or_else(PoisonError::into_inner);
        let records = streams
            .get(&(aggregate_type.as_str().to_owned(), aggregate_id))
            .cloned()
            .unwrap_or_default();
        debug!(%aggregate_type, %aggregate_id, records = records.len(), "loaded event stream");
        Ok(records)
    }

    async fn append_events(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[EventRecord],
    ) -> Result<(), StoreError> {
        if events.is_empty() {
            return Ok(());
        }

        let key = (aggregate_type.as_str().to_owned(), aggregate_id);
        let mut streams = self.streams.write().unwrap_or_else(PoisonError::into_inner);

        let current = streams.get(&key).map_or(0, Vec::len);
        let actual = i64::try_from(current)
            .map_err(|e| StoreError::Infrastructure(format!("stream too long: {e}")))?;
        if actual != expected_version {
            warn!(%aggregate_type, %aggregate_id, expected_version, actual, "stale expected version");
            return Err(StoreError::ConcurrencyConflict {
                aggregate_type: aggregate_type.as_str().to_owned(),
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        let stream = streams.entry(key).or_default();
        stream.extend_from_slice(events);
        debug!(
            %aggregate_type,
            %aggregate_id,
            count = events.len(),
            version = stream.len(),
            "event batch appended"
        );
        Ok(())
    }
}
