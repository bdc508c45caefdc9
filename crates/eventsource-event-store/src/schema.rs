//! Event store database schema.

/// SQL to create the event records table.
///
/// Kept in step with the migration under `migrations/`, which the sqlx test
/// harness applies.
pub const CREATE_EVENT_RECORDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS event_records (
    event_id        UUID PRIMARY KEY,
    aggregate_type  VARCHAR(255) NOT NULL,
    aggregate_id    UUID NOT NULL,
    event_type      VARCHAR(255) NOT NULL,
    payload         JSONB NOT NULL,
    sequence_number BIGINT NOT NULL,
    recorded_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (aggregate_type, aggregate_id, sequence_number)
);
";
