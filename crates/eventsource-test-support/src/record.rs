//! Builders for hand-made `EventRecord`s.

use chrono::{TimeZone, Utc};
use eventsource_core::aggregate::AggregateType;
use eventsource_core::event::EventType;
use eventsource_core::repository::EventRecord;
use uuid::Uuid;

/// Builds a record as a store would persist it, with a fresh event id and a
/// fixed timestamp.
#[must_use]
pub fn make_record(
    aggregate_type: AggregateType,
    aggregate_id: Uuid,
    event_type: EventType,
    payload: serde_json::Value,
    sequence_number: i64,
) -> EventRecord {
    EventRecord {
        event_id: Uuid::now_v7(),
        aggregate_type: aggregate_type.as_str().to_owned(),
        aggregate_id,
        event_type: event_type.as_str().to_owned(),
        payload,
        sequence_number,
        recorded_at: Utc
            .with_ymd_and_hms(2026, 1, 15, 10, 0, 0)
            .single()
            .unwrap_or_default(),
    }
}
