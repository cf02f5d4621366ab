//! Widget configuration.
//!
//! # Responsibility
//! - Hold timer cadences, lookahead window and storage/log locations.
//! - Resolve overrides from `LUMEN_*` environment variables.
//!
//! # Invariants
//! - Defaults reproduce the widget cadence: due-check 1s, carousel 5s,
//!   upcoming window 5 minutes, feedback toasts 4s.

use crate::logging::default_log_level;
use chrono::Duration;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "LUMEN_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "LUMEN_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "LUMEN_LOG_DIR";
const DEFAULT_DB_FILE_NAME: &str = "lumen_widget.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidPeriod(&'static str),
    InvalidWindow(i64),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPeriod(name) => write!(f, "`{name}` must be a positive duration"),
            Self::InvalidWindow(minutes) => {
                write!(f, "upcoming window must be positive, got {minutes} minutes")
            }
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// `None` leaves logging uninitialized (hosts that bring their own).
    pub log_dir: Option<PathBuf>,
    pub due_check_interval: Duration,
    pub carousel_interval: Duration,
    pub upcoming_window_minutes: i64,
    pub toast_duration: std::time::Duration,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            due_check_interval: Duration::milliseconds(1000),
            carousel_interval: Duration::milliseconds(5000),
            upcoming_window_minutes: 5,
            toast_duration: std::time::Duration::from_millis(4000),
        }
    }
}

impl WidgetConfig {
    /// Defaults overridden by `LUMEN_DB_PATH`, `LUMEN_LOG_LEVEL`, `LUMEN_LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` over an arbitrary lookup; blank values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            config.log_level = level;
        }
        config.log_dir = read(LOG_DIR_ENV).map(PathBuf::from);
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.due_check_interval <= Duration::zero() {
            return Err(ConfigError::InvalidPeriod("due_check_interval"));
        }
        if self.carousel_interval <= Duration::zero() {
            return Err(ConfigError::InvalidPeriod("carousel_interval"));
        }
        if self.upcoming_window_minutes <= 0 {
            return Err(ConfigError::InvalidWindow(self.upcoming_window_minutes));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, WidgetConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::path::PathBuf;

    #[test]
    fn defaults_match_widget_cadence() {
        let config = WidgetConfig::default();
        assert_eq!(config.due_check_interval.num_milliseconds(), 1000);
        assert_eq!(config.carousel_interval.num_milliseconds(), 5000);
        assert_eq!(config.upcoming_window_minutes, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lookup_overrides_and_ignores_blank_values() {
        let config = WidgetConfig::from_lookup(|key| match key {
            DB_PATH_ENV => Some("/var/lib/lumen/widget.db".to_string()),
            LOG_LEVEL_ENV => Some("   ".to_string()),
            LOG_DIR_ENV => Some("/var/log/lumen".to_string()),
            _ => None,
        });
        assert_eq!(config.db_path, PathBuf::from("/var/lib/lumen/widget.db"));
        assert_eq!(config.log_level, WidgetConfig::default().log_level);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/lumen")));
    }

    #[test]
    fn validate_rejects_non_positive_window() {
        let config = WidgetConfig {
            upcoming_window_minutes: 0,
            ..WidgetConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidWindow(0)));
    }
}
