//! Widget database: connection setup and the versioned `kv_store` schema.
//!
//! The widget keeps all durable state in one key/value table:
//!
//! ```text
//! kv_store(key TEXT PRIMARY KEY, value TEXT NOT NULL, updated_at INTEGER)
//! ```
//!
//! | key                    | value                                             |
//! |------------------------|---------------------------------------------------|
//! | `selectedShader`       | visual program id as a decimal string (`"1"`..`"4"`) |
//! | `reminders`            | JSON array of camelCase reminder records          |
//! | `reminders.unreadable` | last `reminders` payload that failed to parse     |
//!
//! `updated_at` is epoch milliseconds of the last upsert. Value encoding and
//! the key names live in [`crate::repo::reminder_store`]; this module only
//! owns the table and its migrations.
//!
//! # Invariants
//! - The applied schema version is `PRAGMA user_version`. Pending migrations
//!   run in ascending order inside a single transaction.
//! - A database written by a newer build is refused with
//!   [`DbError::SchemaTooNew`] instead of being migrated down.
//! - No store reads `kv_store` before [`open_db`] or [`open_db_in_memory`]
//!   returns.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// Parent directory of the database file could not be created.
    Io(std::io::Error),
    Sqlite(rusqlite::Error),
    /// `user_version` is ahead of every migration this build knows.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "database directory unavailable: {err}"),
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "widget database is at schema {found}, this build supports up to {supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<std::io::Error> for DbError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
