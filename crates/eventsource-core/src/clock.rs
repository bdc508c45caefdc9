//! Clock abstraction used to stamp persisted event records.

use chrono::{DateTime, Utc};

/// Source of the `recorded_at` timestamp written with each event record.
///
/// Tests inject a fixed clock so stored records are deterministic.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
