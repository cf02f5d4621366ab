//! Reminder domain model.
//!
//! # Responsibility
//! - Define the canonical reminder record persisted by core.
//! - Validate user-submitted reminder input before it reaches the engine.
//!
//! # Invariants
//! - `id` is unique within one reminder collection.
//! - `completed` is monotonic: once `true` it never reverts.
//! - `notified` flips to `true` at most once, and only once `due_at <= now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable reminder identifier.
///
/// Time-derived: creation epoch milliseconds rendered as a decimal string.
pub type ReminderId = String;

/// Canonical reminder record.
///
/// Serialized with camelCase keys (`dueAt`) to keep the stored collection
/// shape compatible with earlier widget builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: ReminderId,
    pub message: String,
    /// RFC 3339 on the wire.
    pub due_at: DateTime<Utc>,
    pub completed: bool,
    /// Older records were written without this flag.
    #[serde(default)]
    pub notified: bool,
}

impl Reminder {
    /// Creates a fresh, incomplete, not-yet-notified reminder.
    pub fn new(id: impl Into<ReminderId>, message: impl Into<String>, due_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            due_at,
            completed: false,
            notified: false,
        }
    }

    /// Returns whether the reminder still counts as active.
    pub fn is_active(&self) -> bool {
        !self.completed
    }

    /// Returns whether the due-check should fire for this reminder at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.completed && !self.notified && self.due_at <= now
    }

    /// Returns whether the reminder is active and due within `(now, now + window]`.
    pub fn is_upcoming(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        if self.completed {
            return false;
        }
        let until_due = self.due_at - now;
        until_due > chrono::Duration::zero() && until_due <= window
    }

    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), ReminderValidationError> {
        if self.id.trim().is_empty() {
            return Err(ReminderValidationError::EmptyId);
        }
        validate_message(self.message.as_str())
    }
}

/// Validation failures for reminder input and persisted records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderValidationError {
    EmptyId,
    EmptyMessage,
    InvalidTimeOfDay(String),
}

impl Display for ReminderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "reminder id cannot be empty"),
            Self::EmptyMessage => write!(f, "reminder message cannot be empty"),
            Self::InvalidTimeOfDay(value) => {
                write!(f, "invalid time of day `{value}`; expected HH:MM")
            }
        }
    }
}

impl Error for ReminderValidationError {}

/// Rejects blank reminder messages.
pub fn validate_message(message: &str) -> Result<(), ReminderValidationError> {
    if message.trim().is_empty() {
        return Err(ReminderValidationError::EmptyMessage);
    }
    Ok(())
}
