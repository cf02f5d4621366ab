//! Notification pipeline: cues, toasts and system notifications.
//!
//! # Responsibility
//! - Define the platform seam (`NotificationPlatform`) the widget talks to.
//! - Turn due reminders and user actions into best-effort feedback.
//!
//! # Invariants
//! - No platform failure propagates past the dispatcher.
//! - System notifications are sent only while permission is `Granted`.

pub mod dispatcher;
pub mod outbox;

use crate::model::reminder::ReminderId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use uuid::Uuid;

/// Named audio cue. Synthesis is left to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// A reminder became due.
    Notification,
    /// A reminder was created.
    Confirmation,
    /// A reminder was marked done.
    Completion,
}

impl Cue {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Notification => "notification",
            Self::Confirmation => "confirmation",
            Self::Completion => "completion",
        }
    }
}

/// Tri-state platform notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Granted,
    Denied,
    Undetermined,
}

impl Permission {
    /// Parses host-reported permission; anything unknown is undetermined.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "granted" => Self::Granted,
            "denied" => Self::Denied,
            _ => Self::Undetermined,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Undetermined => "undetermined",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Info,
    Error,
    Reminder,
}

/// Action button attached to a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToastAction {
    MarkComplete { reminder_id: ReminderId },
}

/// In-app toast request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: String,
    pub kind: ToastKind,
    pub title: String,
    pub description: Option<String>,
    /// `None` keeps the toast until dismissed.
    pub auto_dismiss_after: Option<Duration>,
    pub action: Option<ToastAction>,
}

impl Toast {
    /// Short-lived feedback toast.
    pub fn feedback(
        kind: ToastKind,
        title: impl Into<String>,
        description: Option<String>,
        duration: Duration,
    ) -> Self {
        Self {
            id: format!("toast-{}", Uuid::new_v4()),
            kind,
            title: title.into(),
            description,
            auto_dismiss_after: Some(duration),
            action: None,
        }
    }

    /// Sticky toast for a due reminder carrying a mark-complete action.
    pub fn reminder(reminder_id: &str, message: &str, due_label: String) -> Self {
        Self {
            id: reminder_toast_id(reminder_id),
            kind: ToastKind::Reminder,
            title: message.to_string(),
            description: Some(due_label),
            auto_dismiss_after: None,
            action: Some(ToastAction::MarkComplete {
                reminder_id: reminder_id.to_string(),
            }),
        }
    }
}

/// Stable toast id for a reminder, so completion can dismiss it.
pub fn reminder_toast_id(reminder_id: &str) -> String {
    format!("reminder-{reminder_id}")
}

/// System-level notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemNotification {
    pub title: String,
    pub body: String,
}

/// Failure reported by a platform capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Capability is absent on this host (no audio device, no graphics).
    Unavailable(&'static str),
}

impl Display for PlatformError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(capability) => write!(f, "{capability} unavailable on this host"),
        }
    }
}

impl Error for PlatformError {}

/// Host capabilities used by the dispatcher.
pub trait NotificationPlatform {
    fn play_cue(&mut self, cue: Cue) -> Result<(), PlatformError>;
    fn show_toast(&mut self, toast: &Toast);
    fn dismiss_toast(&mut self, toast_id: &str);
    fn permission(&self) -> Permission;
    /// Asks the user; may still answer `Undetermined` if no decision yet.
    fn request_permission(&mut self) -> Permission;
    fn send_system(&mut self, notification: &SystemNotification);
}
