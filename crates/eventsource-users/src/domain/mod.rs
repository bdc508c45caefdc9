//! Domain model for user accounts.

pub mod aggregates;
pub mod commands;
pub mod events;
