//! Shared test mocks and utilities for eventsource crates.

mod clock;
mod record;
mod repository;

pub use clock::FixedClock;
pub use record::make_record;
pub use repository::{
    AppendCall, EmptyEventRepository, FailingEventRepository, HangingEventRepository,
    RecordingEventRepository,
};
