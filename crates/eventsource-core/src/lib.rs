//! Registries, replay engine and store contract for event-sourced aggregates.
//!
//! This crate defines how aggregate and event kinds are declared, how an
//! aggregate's state is rebuilt by replaying its history, and the Load/Save
//! protocol every persistence adapter honors. It contains no storage I/O.

pub mod aggregate;
pub mod any;
pub mod clock;
pub mod error;
pub mod event;
pub mod registry;
pub mod repository;
pub mod store;

#[cfg(test)]
mod testing;

pub use aggregate::{Aggregate, AggregateType, EventBuffer};
pub use error::{RegistryError, StoreError};
pub use event::{Event, EventType};
pub use registry::{Registry, RegistryBuilder};
pub use repository::{EventRecord, EventRepository};
pub use store::{AggregateStore, AggregateStoreExt, EventSourcedStore};
