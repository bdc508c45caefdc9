//! Host wiring for the eventsource demo binary.

pub mod config;
pub mod error;
pub mod scenario;
