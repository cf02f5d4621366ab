//! Domain model for reminders and visual programs.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every reminder is identified by a stable `ReminderId`.
//! - Visual programs form a closed set selected by numeric id.

pub mod program;
pub mod reminder;
