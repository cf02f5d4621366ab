//! Notification dispatcher.
//!
//! # Responsibility
//! - Fan each due reminder out to cue, toast and system notification.
//! - Emit feedback for create/complete/clear user actions.
//! - Hold system notifications while permission is undetermined.
//!
//! # Invariants
//! - Toasts always fire, whatever the permission or audio state.
//! - Permission is requested at most once per due event.
//! - Deferred notifications are sent once permission is granted and dropped
//!   once it is denied; there is no retry after denial.
//! - The first audio failure disables cues for the dispatcher lifetime.

use super::{
    reminder_toast_id, Cue, NotificationPlatform, Permission, SystemNotification, Toast,
    ToastKind,
};
use crate::model::reminder::Reminder;
use chrono::FixedOffset;
use log::{info, warn};
use std::time::Duration;

const SYSTEM_NOTIFICATION_TITLE: &str = "Reminder";
/// Default lifetime of feedback toasts.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(4000);

/// Outcome counters for one `dispatch_due` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub toasts_shown: usize,
    pub cues_played: usize,
    pub system_sent: usize,
    pub system_deferred: usize,
    pub system_skipped: usize,
}

pub struct NotificationDispatcher<P: NotificationPlatform> {
    platform: P,
    audio_enabled: bool,
    toast_duration: Duration,
    pending: Vec<SystemNotification>,
}

impl<P: NotificationPlatform> NotificationDispatcher<P> {
    pub fn new(platform: P) -> Self {
        Self::with_toast_duration(platform, DEFAULT_TOAST_DURATION)
    }

    pub fn with_toast_duration(platform: P, toast_duration: Duration) -> Self {
        Self {
            platform,
            audio_enabled: true,
            toast_duration,
            pending: Vec::new(),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    /// System notifications waiting on an undetermined permission.
    pub fn pending(&self) -> &[SystemNotification] {
        &self.pending
    }

    /// Notifies the user about reminders returned by the due-check.
    pub fn dispatch_due(&mut self, due: &[Reminder], offset: &FixedOffset) -> DispatchReport {
        let mut report = DispatchReport::default();
        for reminder in due {
            if self.play(Cue::Notification) {
                report.cues_played += 1;
            }

            let toast = Toast::reminder(
                reminder.id.as_str(),
                reminder.message.as_str(),
                format_due_label(reminder, offset),
            );
            self.platform.show_toast(&toast);
            report.toasts_shown += 1;

            let notification = SystemNotification {
                title: SYSTEM_NOTIFICATION_TITLE.to_string(),
                body: reminder.message.clone(),
            };
            match self.platform.permission() {
                Permission::Granted => {
                    self.platform.send_system(&notification);
                    report.system_sent += 1;
                }
                Permission::Denied => report.system_skipped += 1,
                Permission::Undetermined => match self.platform.request_permission() {
                    Permission::Granted => {
                        self.platform.send_system(&notification);
                        report.system_sent += 1;
                    }
                    Permission::Denied => report.system_skipped += 1,
                    Permission::Undetermined => {
                        self.pending.push(notification);
                        report.system_deferred += 1;
                    }
                },
            }
        }

        if !due.is_empty() {
            info!(
                "event=dispatch_due module=notify status=ok due_count={} cues={} toasts={} system_sent={} system_deferred={} system_skipped={}",
                due.len(),
                report.cues_played,
                report.toasts_shown,
                report.system_sent,
                report.system_deferred,
                report.system_skipped
            );
        }
        report
    }

    /// Resolves deferred system notifications against the current permission.
    ///
    /// Returns how many were sent.
    pub fn flush_pending(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        match self.platform.permission() {
            Permission::Granted => {
                let pending = std::mem::take(&mut self.pending);
                for notification in &pending {
                    self.platform.send_system(notification);
                }
                info!(
                    "event=pending_flush module=notify status=sent count={}",
                    pending.len()
                );
                pending.len()
            }
            Permission::Denied => {
                info!(
                    "event=pending_flush module=notify status=dropped count={} reason=permission_denied",
                    self.pending.len()
                );
                self.pending.clear();
                0
            }
            Permission::Undetermined => 0,
        }
    }

    /// Feedback for a newly created reminder.
    pub fn reminder_created(&mut self, reminder: &Reminder, offset: &FixedOffset) {
        self.play(Cue::Confirmation);
        let toast = Toast::feedback(
            ToastKind::Success,
            "Reminder set",
            Some(format_due_label(reminder, offset)),
            self.toast_duration,
        );
        self.platform.show_toast(&toast);
    }

    /// Feedback for a completed reminder; also retires its sticky toast.
    pub fn reminder_completed(&mut self, reminder: &Reminder) {
        self.play(Cue::Completion);
        self.platform
            .dismiss_toast(reminder_toast_id(reminder.id.as_str()).as_str());
        let toast = Toast::feedback(
            ToastKind::Success,
            "Reminder completed",
            Some(reminder.message.clone()),
            self.toast_duration,
        );
        self.platform.show_toast(&toast);
    }

    /// Feedback for bulk-clear. Silent when nothing was removed.
    pub fn reminders_cleared(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let suffix = if count == 1 { "" } else { "s" };
        let toast = Toast::feedback(
            ToastKind::Info,
            format!("Cleared {count} reminder{suffix}"),
            None,
            self.toast_duration,
        );
        self.platform.show_toast(&toast);
    }

    /// Surfaces a failure to the user without interrupting anything else.
    pub fn report_error(&mut self, title: impl Into<String>, detail: impl Into<String>) {
        let toast = Toast::feedback(
            ToastKind::Error,
            title,
            Some(detail.into()),
            self.toast_duration,
        );
        self.platform.show_toast(&toast);
    }

    fn play(&mut self, cue: Cue) -> bool {
        if !self.audio_enabled {
            return false;
        }
        match self.platform.play_cue(cue) {
            Ok(()) => true,
            Err(err) => {
                self.audio_enabled = false;
                warn!(
                    "event=audio_disabled module=notify status=degraded cue={} error={err}",
                    cue.as_str()
                );
                false
            }
        }
    }
}

/// Formats the reminder's due time as local `HH:MM`.
pub fn format_due_label(reminder: &Reminder, offset: &FixedOffset) -> String {
    reminder
        .due_at
        .with_timezone(offset)
        .format("%H:%M")
        .to_string()
}
