//! Core use-case services.
//!
//! # Responsibility
//! - Own reminder state and expose use-case level operations.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod carousel;
pub mod reminder_engine;
