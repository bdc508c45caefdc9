//! `PostgreSQL` implementation of the `EventRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use eventsource_core::aggregate::AggregateType;
use eventsource_core::error::StoreError;
use eventsource_core::repository::{EventRecord, EventRepository};

use crate::schema::CREATE_EVENT_RECORDS_TABLE;

const SELECT_STREAM: &str = r"
SELECT event_id, aggregate_type, aggregate_id, event_type, payload, sequence_number, recorded_at
FROM event_records
WHERE aggregate_type = $1 AND aggregate_id = $2
ORDER BY sequence_number ASC
";

const SELECT_VERSION: &str = r"
SELECT COALESCE(MAX(sequence_number), 0)
FROM event_records
WHERE aggregate_type = $1 AND aggregate_id = $2
";

const INSERT_RECORD: &str = r"
INSERT INTO event_records
    (event_id, aggregate_type, aggregate_id, event_type, payload, sequence_number, recorded_at)
VALUES ($1, $2, $3, $4, $5, $6, $7)
";

#[derive(sqlx::FromRow)]
struct EventRow {
    event_id: Uuid,
    aggregate_type: String,
    aggregate_id: Uuid,
    event_type: String,
    payload: serde_json::Value,
    sequence_number: i64,
    recorded_at: DateTime<Utc>,
}

impl From<EventRow> for EventRecord {
    fn from(row: EventRow) -> Self {
        Self {
            event_id: row.event_id,
            aggregate_type: row.aggregate_type,
            aggregate_id: row.aggregate_id,
            event_type: row.event_type,
            payload: row.payload,
            sequence_number: row.sequence_number,
            recorded_at: row.recorded_at,
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
fn infrastructure(err: sqlx::Error) -> StoreError {
    StoreError::Infrastructure(err.to_string())
}

/// `PostgreSQL`-backed event repository.
///
/// Each `append_events` batch is written in one transaction after checking
/// the expected version, so a batch is either fully persisted or not at all.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `event_records` table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Infrastructure` if the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(CREATE_EVENT_RECORDS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(())
    }

    async fn current_version(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
    ) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(SELECT_VERSION)
            .bind(aggregate_type.as_str())
            .bind(aggregate_id)
            .fetch_one(&self.pool)
            .await
            .map_err(infrastructure)
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    #[instrument(skip_all, fields(aggregate_type = %aggregate_type, aggregate_id = %aggregate_id))]
    async fn load_events(
        &self,
        aggregate_type: AggregateType,
        aggregate_id: Uuid,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(SELECT_STREAM)
            .bind(aggregate_type.as_str())
            .bind(aggregate_id)
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure)?;

        debug!(records = rows.len(), "loaded event stream");
        Ok(rows.into_iter().map(EventRecord::from).collect())
    }

    #[instrument(
        skip_all,
        fields(
            aggregate_type = %aggregate_type,
            aggregate_id = %aggregate_id,
            expected_version = expected_version,
            count = events.len(),
        )
    )]
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

        let mut tx = self.pool.begin().await.map_err(infrastructure)?;

        let actual = sqlx::query_scalar::<_, i64>(SELECT_VERSION)
            .bind(aggregate_type.as_str())
            .bind(aggregate_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(infrastructure)?;
        if actual != expected_version {
            warn!(actual, "stale expected version");
            return Err(StoreError::ConcurrencyConflict {
                aggregate_type: aggregate_type.as_str().to_owned(),
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        for event in events {
            let inserted = sqlx::query(INSERT_RECORD)
                .bind(event.event_id)
                .bind(aggregate_type.as_str())
                .bind(aggregate_id)
                .bind(&event.event_type)
                .bind(&event.payload)
                .bind(event.sequence_number)
                .bind(event.recorded_at)
                .execute(&mut *tx)
                .await;

            match inserted {
                Ok(_) => {}
                // A concurrent writer committed the same sequence number
                // between our version check and this insert.
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    drop(tx);
                    let actual = self.current_version(aggregate_type, aggregate_id).await?;
                    warn!(actual, "sequence number already taken");
                    return Err(StoreError::ConcurrencyConflict {
                        aggregate_type: aggregate_type.as_str().to_owned(),
                        aggregate_id,
                        expected: expected_version,
                        actual,
                    });
                }
                Err(err) => return Err(infrastructure(err)),
            }
        }

        tx.commit().await.map_err(infrastructure)?;
        debug!("event batch committed");
        Ok(())
    }
}
