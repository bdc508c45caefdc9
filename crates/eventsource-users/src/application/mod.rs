//! Application layer for user accounts.

pub mod command_handlers;
