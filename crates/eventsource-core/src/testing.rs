//! Ledger fixtures shared by the unit tests of this crate.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{Aggregate, AggregateType, EventBuffer};
use crate::clock::Clock;
use crate::error::StoreError;
use crate::event::{Event, EventType};
use crate::registry::RegistryBuilder;
use crate::repository::{EventRecord, EventRepository};

pub(crate) const LEDGER: AggregateType = AggregateType::new("Ledger");
pub(crate) const DEPOSITED: EventType = EventType::new("Deposited");
pub(crate) const WITHDRAWN: EventType = EventType::new("Withdrawn");
pub(crate) const NOTED: EventType = EventType::new("Noted");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Deposited {
    pub amount: i64,
}

impl Event for Deposited {
    fn event_type(&self) -> EventType {
        DEPOSITED
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Withdrawn {
    pub amount: i64,
}

impl Event for Withdrawn {
    fn event_type(&self) -> EventType {
        WITHDRAWN
    }
}

/// Registered, but the ledger ignores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Noted {
    pub text: String,
}

impl Event for Noted {
    fn event_type(&self) -> EventType {
        NOTED
    }
}

#[derive(Debug)]
pub(crate) struct Ledger {
    pub id: Uuid,
    pub balance: i64,
    /// Amounts in application order, to observe replay ordering.
    pub history: Vec<i64>,
    events: EventBuffer,
}

impl Ledger {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            balance: 0,
            history: Vec::new(),
            events: EventBuffer::new(),
        }
    }
}

impl Aggregate for Ledger {
    fn aggregate_type(&self) -> AggregateType {
        LEDGER
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn handle_event(&mut self, event: &dyn Event) {
        if let Some(deposited) = event.downcast_ref::<Deposited>() {
            self.balance += deposited.amount;
            self.history.push(deposited.amount);
        } else if let Some(withdrawn) = event.downcast_ref::<Withdrawn>() {
            self.balance -= withdrawn.amount;
            self.history.push(-withdrawn.amount);
        }
    }

    fn event_buffer(&self) -> &EventBuffer {
        &self.events
    }

    fn event_buffer_mut(&mut self) -> &mut EventBuffer {
        &mut self.events
    }
}

/// Builder with the ledger aggregate and all three ledger events registered.
pub(crate) fn ledger_registry() -> RegistryBuilder {
    let mut builder = RegistryBuilder::new();
    builder
        .register_aggregate(Ledger::new)
        .register_event(Deposited::default)
        .register_event(Withdrawn::default)
        .register_event(Noted::default);
    builder
}

pub(crate) struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Minimal repository over a vector, with switchable failures.
#[derive(Default)]
pub(crate) struct VecRepository {
    records: Mutex<Vec<EventRecord>>,
    expected_versions: Mutex<Vec<i64>>,
    pub fail_load: AtomicBool,
    pub fail_append: AtomicBool,
}

impl VecRepository {
    pub fn push(&self, record: EventRecord) {
        self.records.lock().unwrap().push(record);
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn expected_versions(&self) -> Vec<i64> {
        self.expected_versions.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for VecRepository {
    async fn load_events(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
    ) -> Result<Vec<EventRecord>, StoreError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(StoreError::Infrastructure("connection refused".into()));
        }
        let mut stream: Vec<EventRecord> = self
            .records()
            .into_iter()
            .filter(|r| r.aggregate_type == aggregate_type.as_str() && r.aggregate_id == aggregate_id)
            .collect();
        stream.sort_by_key(|r| r.sequence_number);
        Ok(stream)
    }

    async fn append_events(
        &self,
        _aggregate_type: AggregateType,
        _aggregate_id: Uuid,
        expected_version: i64,
        events: &[EventRecord],
    ) -> Result<(), StoreError> {
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(StoreError::Infrastructure("connection refused".into()));
        }
        self.expected_versions.lock().unwrap().push(expected_version);
        self.records.lock().unwrap().extend_from_slice(events);
        Ok(())
    }
}

/// Repository whose calls never complete, for cancellation tests.
pub(crate) struct HangingRepository;

#[async_trait]
impl EventRepository for HangingRepository {
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
