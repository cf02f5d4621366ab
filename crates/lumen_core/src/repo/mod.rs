//! Repository layer: persistence contracts and SQLite implementation.
//!
//! # Responsibility
//! - Isolate SQL and JSON encoding details from the engine.
//!
//! # Invariants
//! - Persisted reminders pass `Reminder::validate()` on load.

pub mod reminder_store;
