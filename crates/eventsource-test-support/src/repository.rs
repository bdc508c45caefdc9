//! Mock `EventRepository` implementations for tests.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use eventsource_core::aggregate::AggregateType;
use eventsource_core::error::StoreError;
use eventsource_core::repository::{EventRecord, EventRepository};
use uuid::Uuid;

/// One recorded `append_events` call.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendCall {
    /// Aggregate kind passed to the call.
    pub aggregate_type: String,
    /// Aggregate identity passed to the call.
    pub aggregate_id: Uuid,
    /// Stream length the writer expected.
    pub expected_version: i64,
    /// The batch itself.
    pub records: Vec<EventRecord>,
}

/// An event repository that records every `append_events` call. Returns the
/// configured records from every `load_events` call and always accepts
/// appends without checking versions.
#[derive(Debug, Default)]
pub struct RecordingEventRepository {
    load_result: Vec<EventRecord>,
    loads: Mutex<Vec<(String, Uuid)>>,
    appended: Mutex<Vec<AppendCall>>,
}

impl RecordingEventRepository {
    /// Create a repository that returns `load_result` from every
    /// `load_events` call.
    #[must_use]
    pub fn new(load_result: Vec<EventRecord>) -> Self {
        Self {
            load_result,
            ..Self::default()
        }
    }

    /// Snapshot of every `append_events` call, in call order.
    pub fn appended_events(&self) -> Vec<AppendCall> {
        self.appended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of every stream passed to `load_events`, in call order.
    pub fn loaded_streams(&self) -> Vec<(String, Uuid)> {
        self.loads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
    ) -> Result<Vec<EventRecord>, StoreError> {
        self.loads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((aggregate_type.as_str().to_owned(), aggregate_id));
        Ok(self.load_result.clone())
    }

    async fn append_events(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[EventRecord],
    ) -> Result<(), StoreError> {
        self.appended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(AppendCall {
                aggregate_type: aggregate_type.as_str().to_owned(),
                aggregate_id,
                expected_version,
                records: events.to_vec(),
            });
        Ok(())
    }
}

/// An event repository that always returns an empty stream and silently
/// accepts appends. Useful for creation commands.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(
        &self,
        _aggregate_type: AggregateType,
        _aggregate_id: Uuid,
    ) -> Result<Vec<EventRecord>, StoreError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        _aggregate_type: AggregateType,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[EventRecord],
    ) -> Result<(), StoreError> {
        Ok(())
    }
}

/// An event repository that always returns an infrastructure error. Useful
/// for testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(
        &self,
        _aggregate_type: AggregateType,
        _aggregate_id: Uuid,
    ) -> Result<Vec<EventRecord>, StoreError> {
        Err(StoreError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate_type: AggregateType,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[EventRecord],
    ) -> Result<(), StoreError> {
        Err(StoreError::Infrastructure("connection refused".into()))
    }
}

/// An event repository whose calls never complete. Wrap calls in a timeout
/// to test cancellation.
#[derive(Debug)]
pub struct HangingEventRepository;

#[async_trait]
impl EventRepository for HangingEventRepository {
    async fn load_events(
        &self,
        _aggregate_type: AggregateType,
        _aggregate_id: Uuid,
    ) -> Result<Vec<EventRecord>, StoreError> {
        std::future::pending().await
    }

    async fn append_events(
        &self,
        _aggregate_type: AggregateType,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[EventRecord],
    ) -> Result<(), StoreError> {
        std::future::pending().await
    }
}
