//! Persistence adapters for `eventsource-core`.
//!
//! Both repositories implement `EventRepository` and are meant to be wrapped
//! in an `EventSourcedStore`, which provides the aggregate Load/Save
//! protocol on top of them.

pub mod config;
pub mod memory_event_repository;
pub mod pg_event_repository;
pub mod schema;

pub use config::{ConfigError, PgStoreConfig};
pub use memory_event_repository::InMemoryEventRepository;
pub use pg_event_repository::PgEventRepository;
