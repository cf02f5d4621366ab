//! Reminder lifecycle engine.
//!
//! # Responsibility
//! - Own the reminder collection for the lifetime of the widget.
//! - Expose create/complete/clear/query use-cases and the periodic due-check.
//! - Persist every mutation before returning to the caller.
//!
//! # Invariants
//! - Ids are unique within the collection.
//! - `completed` never reverts; `notified` is set at most once.
//! - A failed write rolls the in-memory mutation back (except the due-check,
//!   which must not fire twice in-process).
//! - Unknown ids are no-ops reported as `false`, never as errors.

use crate::clock::Clock;
use crate::model::reminder::{validate_message, Reminder, ReminderId, ReminderValidationError};
use crate::repo::reminder_store::{ReminderStore, StoreError};
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Timelike, Utc};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static TIME_OF_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,2}):(\d{2})\s*$").expect("valid time-of-day regex"));

pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error.
#[derive(Debug)]
pub enum EngineError {
    /// Submission rejected; nothing was created or persisted.
    Validation(ReminderValidationError),
    /// Durability write or load failed.
    Store(StoreError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ReminderValidationError> for EngineError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Reminder collection owner.
pub struct ReminderEngine<S: ReminderStore, C: Clock> {
    store: S,
    clock: C,
    reminders: Vec<Reminder>,
}

impl<S: ReminderStore, C: Clock> ReminderEngine<S, C> {
    /// Loads the persisted collection.
    ///
    /// # Errors
    /// - Returns `EngineError::Store` when stored data is unreadable.
    pub fn load(store: S, clock: C) -> EngineResult<Self> {
        let reminders = store.load_reminders()?;
        info!(
            "event=engine_load module=engine status=ok count={}",
            reminders.len()
        );
        Ok(Self::with_reminders(store, clock, reminders))
    }

    /// Builds an engine over an already-loaded (or empty) collection.
    pub fn with_reminders(store: S, clock: C, reminders: Vec<Reminder>) -> Self {
        Self {
            store,
            clock,
            reminders,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Full collection snapshot in insertion order.
    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn get(&self, id: &str) -> Option<&Reminder> {
        self.reminders.iter().find(|reminder| reminder.id == id)
    }

    /// Creates one reminder due at `due_at`.
    ///
    /// # Errors
    /// - `Validation` when `message` is blank.
    /// - `Store` when the write fails; the reminder is not kept.
    pub fn create(
        &mut self,
        message: impl Into<String>,
        due_at: DateTime<Utc>,
    ) -> EngineResult<Reminder> {
        let message = message.into();
        validate_message(message.as_str())?;

        let reminder = Reminder::new(self.next_id(), message, due_at);
        self.reminders.push(reminder.clone());
        if let Err(err) = self.store.save_reminders(&self.reminders) {
            self.reminders.pop();
            error!(
                "event=reminder_create module=engine status=error error_code=persist_failed error={err}"
            );
            return Err(err.into());
        }

        info!(
            "event=reminder_create module=engine status=ok id={} due_at={}",
            reminder.id,
            reminder.due_at.to_rfc3339()
        );
        Ok(reminder)
    }

    /// Creates a reminder from a `HH:MM` time-of-day submission.
    ///
    /// The time resolves against today in the clock's local offset; a time
    /// already past rolls over to the same time tomorrow.
    pub fn create_at_time_of_day(
        &mut self,
        message: impl Into<String>,
        time_text: &str,
    ) -> EngineResult<Reminder> {
        let message = message.into();
        validate_message(message.as_str())?;
        let time = parse_time_of_day(time_text)?;
        let due_at = resolve_time_of_day(self.clock.now_local(), time)
            .ok_or_else(|| ReminderValidationError::InvalidTimeOfDay(time_text.to_string()))?;
        self.create(message, due_at.with_timezone(&Utc))
    }

    /// Marks one reminder completed.
    ///
    /// Returns `Ok(false)` for unknown or already-completed ids.
    pub fn complete(&mut self, id: &str) -> EngineResult<bool> {
        let Some(index) = self
            .reminders
            .iter()
            .position(|reminder| reminder.id == id && !reminder.completed)
        else {
            info!("event=reminder_complete module=engine status=noop id={id}");
            return Ok(false);
        };

        self.reminders[index].completed = true;
        if let Err(err) = self.store.save_reminders(&self.reminders) {
            self.reminders[index].completed = false;
            error!(
                "event=reminder_complete module=engine status=error id={id} error_code=persist_failed error={err}"
            );
            return Err(err.into());
        }

        info!("event=reminder_complete module=engine status=ok id={id}");
        Ok(true)
    }

    /// Removes every incomplete reminder and keeps completed ones.
    ///
    /// Returns the number removed; nothing is written when that is zero.
    pub fn clear_incomplete(&mut self) -> EngineResult<usize> {
        let removed = self.active_count();
        if removed == 0 {
            return Ok(0);
        }

        let previous = std::mem::take(&mut self.reminders);
        self.reminders = previous
            .iter()
            .filter(|reminder| reminder.completed)
            .cloned()
            .collect();
        if let Err(err) = self.store.save_reminders(&self.reminders) {
            self.reminders = previous;
            error!(
                "event=reminders_clear module=engine status=error error_code=persist_failed error={err}"
            );
            return Err(err.into());
        }

        info!("event=reminders_clear module=engine status=ok removed={removed}");
        Ok(removed)
    }

    /// Incomplete reminders in insertion order.
    pub fn active_reminders(&self) -> Vec<&Reminder> {
        self.reminders
            .iter()
            .filter(|reminder| reminder.is_active())
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.reminders
            .iter()
            .filter(|reminder| reminder.is_active())
            .count()
    }

    pub fn has_active(&self) -> bool {
        self.reminders.iter().any(Reminder::is_active)
    }

    /// Whether an active reminder is due within `(now, now + window]`.
    pub fn has_upcoming(&self, window_minutes: i64) -> bool {
        self.has_upcoming_at(self.clock.now(), window_minutes)
    }

    pub fn has_upcoming_at(&self, now: DateTime<Utc>, window_minutes: i64) -> bool {
        let window = Duration::minutes(window_minutes);
        self.reminders
            .iter()
            .any(|reminder| reminder.is_upcoming(now, window))
    }

    /// Marks newly due reminders as notified and returns them.
    ///
    /// Each reminder is returned by exactly one call. A failed write is logged
    /// and the in-memory flags are kept so nothing fires twice.
    pub fn due_check(&mut self, now: DateTime<Utc>) -> Vec<Reminder> {
        let mut due = Vec::new();
        for reminder in self.reminders.iter_mut() {
            if reminder.is_due(now) {
                reminder.notified = true;
                due.push(reminder.clone());
            }
        }
        if due.is_empty() {
            return due;
        }

        match self.store.save_reminders(&self.reminders) {
            Ok(()) => info!(
                "event=due_check module=engine status=ok due_count={}",
                due.len()
            ),
            Err(err) => error!(
                "event=due_check module=engine status=error due_count={} error_code=persist_failed error={err}",
                due.len()
            ),
        }
        due
    }

    fn next_id(&self) -> ReminderId {
        let taken = self
            .reminders
            .iter()
            .map(|reminder| reminder.id.as_str())
            .collect::<HashSet<_>>();
        let mut candidate = self.clock.now().timestamp_millis();
        while taken.contains(candidate.to_string().as_str()) {
            candidate += 1;
        }
        candidate.to_string()
    }
}

/// Parses `H:MM` / `HH:MM` (24-hour) input.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, ReminderValidationError> {
    let invalid = || ReminderValidationError::InvalidTimeOfDay(value.to_string());
    let caps = TIME_OF_DAY_RE.captures(value).ok_or_else(invalid)?;
    let hour = caps[1].parse::<u32>().map_err(|_| invalid())?;
    let minute = caps[2].parse::<u32>().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Resolves a time-of-day to the next occurrence not earlier than `now`.
///
/// Returns `None` only when the local date arithmetic overflows.
pub fn resolve_time_of_day(
    now: DateTime<FixedOffset>,
    time: NaiveTime,
) -> Option<DateTime<FixedOffset>> {
    let offset = *now.offset();
    let today = offset
        .from_local_datetime(&now.date_naive().and_time(time))
        .single()?;
    if today >= now {
        return Some(today);
    }
    let tomorrow = now.date_naive().succ_opt()?;
    offset.from_local_datetime(&tomorrow.and_time(time)).single()
}

/// Suggested time for a new reminder: `now` rounded up to the next quarter hour.
///
/// A partial minute counts as elapsed, so the suggestion never resolves to a
/// time already behind `now`. Past 23:45 it wraps to midnight.
pub fn default_time_of_day(now: DateTime<FixedOffset>) -> NaiveTime {
    let partial_minute = u32::from(now.second() > 0 || now.nanosecond() > 0);
    let minutes = now.hour() * 60 + now.minute() + partial_minute;
    let rounded = minutes.div_ceil(15) * 15 % (24 * 60);
    NaiveTime::from_hms_opt(rounded / 60, rounded % 60, 0).unwrap_or(NaiveTime::MIN)
}
