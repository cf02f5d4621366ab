//! Durable storage for the reminder collection and program selection.
//!
//! # Responsibility
//! - Persist the ordered reminder collection as one JSON document.
//! - Persist the selected visual program as a string-encoded integer.
//!
//! # Invariants
//! - Saving replaces the whole collection; load returns it in saved order.
//! - A record that fails validation is skipped on load; the rest survive.
//! - An unparsable collection is copied to `REMINDERS_UNREADABLE_KEY` before
//!   the load fails, so a later save cannot destroy it.
//! - Timestamps round-trip exactly (RFC 3339 with sub-second precision).

use crate::db::DbError;
use crate::model::program::VisualProgramId;
use crate::model::reminder::{Reminder, ReminderValidationError};
use log::{debug, warn};
use std::collections::HashSet;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key holding the selected program id.
pub const SELECTED_PROGRAM_KEY: &str = "selectedShader";
/// Storage key holding the serialized reminder collection.
pub const REMINDERS_KEY: &str = "reminders";
/// Storage key holding the last collection payload that failed to parse.
pub const REMINDERS_UNREADABLE_KEY: &str = "reminders.unreadable";

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence error for reminder/selection storage.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Serialization(serde_json::Error),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "reminder collection encoding failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted reminder data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl From<ReminderValidationError> for StoreError {
    fn from(value: ReminderValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

/// Persistence contract consumed by the engine and the widget.
pub trait ReminderStore {
    fn load_reminders(&self) -> StoreResult<Vec<Reminder>>;
    fn save_reminders(&self, reminders: &[Reminder]) -> StoreResult<()>;
    fn load_selected_program(&self) -> StoreResult<Option<VisualProgramId>>;
    fn save_selected_program(&self, id: VisualProgramId) -> StoreResult<()>;
}

impl<S: ReminderStore + ?Sized> ReminderStore for &S {
    fn load_reminders(&self) -> StoreResult<Vec<Reminder>> {
        (**self).load_reminders()
    }

    fn save_reminders(&self, reminders: &[Reminder]) -> StoreResult<()> {
        (**self).save_reminders(reminders)
    }

    fn load_selected_program(&self) -> StoreResult<Option<VisualProgramId>> {
        (**self).load_selected_program()
    }

    fn save_selected_program(&self, id: VisualProgramId) -> StoreResult<()> {
        (**self).save_selected_program(id)
    }
}

/// SQLite-backed store over the `kv_store` table.
pub struct SqliteReminderStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReminderStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn get_value(&self, key: &str) -> StoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_value(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}

impl ReminderStore for SqliteReminderStore<'_> {
    fn load_reminders(&self) -> StoreResult<Vec<Reminder>> {
        let Some(raw) = self.get_value(REMINDERS_KEY)? else {
            return Ok(Vec::new());
        };
        let records: Vec<serde_json::Value> = match serde_json::from_str(raw.as_str()) {
            Ok(records) => records,
            Err(err) => {
                self.set_value(REMINDERS_UNREADABLE_KEY, raw.as_str())?;
                warn!(
                    "event=reminders_load module=store status=error error_code=unparsable preserved_key={REMINDERS_UNREADABLE_KEY}"
                );
                return Err(StoreError::InvalidData(format!("`{REMINDERS_KEY}`: {err}")));
            }
        };

        let total = records.len();
        let mut seen = HashSet::with_capacity(total);
        let mut reminders = Vec::with_capacity(total);
        for (index, record) in records.into_iter().enumerate() {
            let reminder = match decode_record(record) {
                Ok(reminder) => reminder,
                Err(err) => {
                    warn!("event=reminders_load module=store status=skipped index={index} error={err}");
                    continue;
                }
            };
            if !seen.insert(reminder.id.clone()) {
                warn!(
                    "event=reminders_load module=store status=skipped index={index} error_code=duplicate_id id={}",
                    reminder.id
                );
                continue;
            }
            reminders.push(reminder);
        }

        debug!(
            "event=reminders_load module=store status=ok count={} skipped={}",
            reminders.len(),
            total - reminders.len()
        );
        Ok(reminders)
    }

    fn save_reminders(&self, reminders: &[Reminder]) -> StoreResult<()> {
        let encoded = serde_json::to_string(reminders)?;
        self.set_value(REMINDERS_KEY, encoded.as_str())?;
        debug!(
            "event=reminders_save module=store status=ok count={}",
            reminders.len()
        );
        Ok(())
    }

    fn load_selected_program(&self) -> StoreResult<Option<VisualProgramId>> {
        match self.get_value(SELECTED_PROGRAM_KEY)? {
            Some(raw) => VisualProgramId::parse(raw.as_str()).map(Some).ok_or_else(|| {
                StoreError::InvalidData(format!("`{SELECTED_PROGRAM_KEY}` holds `{raw}`"))
            }),
            None => Ok(None),
        }
    }

    fn save_selected_program(&self, id: VisualProgramId) -> StoreResult<()> {
        self.set_value(SELECTED_PROGRAM_KEY, id.number().to_string().as_str())
    }
}

fn decode_record(record: serde_json::Value) -> StoreResult<Reminder> {
    let reminder: Reminder = serde_json::from_value(record)
        .map_err(|err| StoreError::InvalidData(err.to_string()))?;
    reminder.validate()?;
    Ok(reminder)
}
