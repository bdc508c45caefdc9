//! `EventSourcedStore` running on top of `InMemoryEventRepository`.

use std::sync::Arc;

use eventsource_core::aggregate::{Aggregate, AggregateType, EventBuffer};
use eventsource_core::error::StoreError;
use eventsource_core::event::{Event, EventType};
use eventsource_core::registry::RegistryBuilder;
use eventsource_core::repository::EventRepository;
use eventsource_core::store::{AggregateStore, AggregateStoreExt, EventSourcedStore};
use eventsource_event_store::InMemoryEventRepository;
use eventsource_test_support::{FixedClock, make_record};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const COUNTER: AggregateType = AggregateType::new("Counter");
const INCREMENTED: EventType = EventType::new("Incremented");

#[derive(Debug, Default, Serialize, Deserialize)]
struct Incremented {
    by: u32,
}

impl Event for Incremented {
    fn event_type(&self) -> EventType {
        INCREMENTED
    }
}

#[derive(Debug)]
struct Counter {
    id: Uuid,
    total: u32,
    events: EventBuffer,
}

impl Aggregate for Counter {
    fn aggregate_type(&self) -> AggregateType {
        COUNTER
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn handle_event(&mut self, event: &dyn Event) {
        if let Some(incremented) = event.downcast_ref::<Incremented>() {
            self.total += incremented.by;
        }
    }

    fn event_buffer(&self) -> &EventBuffer {
        &self.events
    }

    fn event_buffer_mut(&mut self) -> &mut EventBuffer {
        &mut self.events
    }
}

fn counter_store() -> EventSourcedStore<InMemoryEventRepository> {
    let mut builder = RegistryBuilder::new();
    builder
        .register_aggregate(|id| Counter {
            id,
            total: 0,
            events: EventBuffer::new(),
        })
        .register_event(Incremented::default);
    EventSourcedStore::new(
        InMemoryEventRepository::new(),
        builder.build(),
        Arc::new(FixedClock::default()),
    )
}

#[tokio::test]
async fn test_saved_records_carry_stream_position_and_clock_time() {
    // Arrange
    let store = counter_store();
    let id = Uuid::new_v4();
    let mut counter = store.load_as::<Counter>(COUNTER, id).await.unwrap();
    counter.append_event(Incremented { by: 2 });
    counter.append_event(Incremented { by: 3 });

    // Act
    store.save(&mut *counter).await.unwrap();
    counter.append_event(Incremented { by: 5 });
    store.save(&mut *counter).await.unwrap();

    // Assert
    let records = store.repository().load_events(COUNTER, id).await.unwrap();
    let sequence: Vec<i64> = records.iter().map(|r| r.sequence_number).collect();
    assert_eq!(sequence, vec![1, 2, 3]);
    assert!(records.iter().all(|r| r.recorded_at == FixedClock::default().0));
    assert!(records.iter().all(|r| r.event_type == "Incremented"));
    assert_eq!(records[2].payload, serde_json::json!({"by": 5}));

    let reloaded = store.load_as::<Counter>(COUNTER, id).await.unwrap();
    assert_eq!(reloaded.total, 10);
    assert_eq!(reloaded.version(), 3);
}

#[tokio::test]
async fn test_corrupt_payload_fails_the_whole_load() {
    // Arrange
    let store = counter_store();
    let id = Uuid::new_v4();
    let records = vec![
        make_record(COUNTER, id, INCREMENTED, serde_json::json!({"by": 1}), 1),
        make_record(COUNTER, id, INCREMENTED, serde_json::json!({"by": "lots"}), 2),
    ];
    store
        .repository()
        .append_events(COUNTER, id, 0, &records)
        .await
        .unwrap();

    // Act
    let result = store.load(COUNTER, id).await;

    // Assert
    match result {
        Err(StoreError::Decode { event_type, .. }) => assert_eq!(event_type, "Incremented"),
        other => panic!("expected Decode, got {other:?}"),
    }
}
