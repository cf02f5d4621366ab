use chrono::{FixedOffset, TimeZone, Utc};
use lumen_core::notify::reminder_toast_id;
use lumen_core::{
    Cue, NotificationDispatcher, Outbox, Permission, Reminder, SystemNotification, ToastAction,
    ToastKind,
};
use std::time::Duration;

fn offset() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).unwrap()
}

fn due_reminder(id: &str, message: &str) -> Reminder {
    let due = Utc.with_ymd_and_hms(2026, 4, 20, 12, 33, 0).single().unwrap();
    let mut reminder = Reminder::new(id, message, due);
    reminder.notified = true;
    reminder
}

#[test]
fn granted_permission_sends_cue_toast_and_system_notification() {
    let mut dispatcher = NotificationDispatcher::new(Outbox::new(Permission::Granted));

    let report = dispatcher.dispatch_due(&[due_reminder("7", "Call Bob")], &offset());

    assert_eq!(report.cues_played, 1);
    assert_eq!(report.toasts_shown, 1);
    assert_eq!(report.system_sent, 1);
    let batch = dispatcher.platform_mut().drain();
    assert_eq!(batch.cues, vec![Cue::Notification]);
    assert_eq!(
        batch.system,
        vec![SystemNotification {
            title: "Reminder".to_string(),
            body: "Call Bob".to_string(),
        }]
    );
    let toast = &batch.toasts[0];
    assert_eq!(toast.id, reminder_toast_id("7"));
    assert_eq!(toast.kind, ToastKind::Reminder);
    assert_eq!(toast.title, "Call Bob");
    assert_eq!(toast.description.as_deref(), Some("14:33"));
    assert_eq!(toast.auto_dismiss_after, None);
    assert_eq!(
        toast.action,
        Some(ToastAction::MarkComplete {
            reminder_id: "7".to_string()
        })
    );
    assert!(!batch.permission_requested);
}

#[test]
fn denied_permission_still_shows_toast() {
    let mut dispatcher = NotificationDispatcher::new(Outbox::new(Permission::Denied));

    let report = dispatcher.dispatch_due(&[due_reminder("1", "stretch")], &offset());

    assert_eq!(report.system_skipped, 1);
    let batch = dispatcher.platform_mut().drain();
    assert_eq!(batch.toasts.len(), 1);
    assert!(batch.system.is_empty());
    assert_eq!(dispatcher.platform().permission_requests(), 0);
}

#[test]
fn undetermined_permission_is_requested_once_per_due_reminder() {
    let outbox = Outbox::new(Permission::Undetermined).with_prompt_answer(Permission::Granted);
    let mut dispatcher = NotificationDispatcher::new(outbox);

    let report = dispatcher.dispatch_due(
        &[due_reminder("1", "first"), due_reminder("2", "second")],
        &offset(),
    );

    assert_eq!(report.system_sent, 2);
    assert_eq!(dispatcher.platform().permission_requests(), 1);
    assert!(dispatcher.pending().is_empty());
}

#[test]
fn deferred_notifications_flush_after_grant() {
    let mut dispatcher = NotificationDispatcher::new(Outbox::default());

    let report = dispatcher.dispatch_due(&[due_reminder("1", "tea")], &offset());
    assert_eq!(report.system_deferred, 1);
    assert_eq!(dispatcher.pending().len(), 1);
    assert_eq!(dispatcher.flush_pending(), 0);

    dispatcher.platform_mut().drain();
    dispatcher.platform_mut().set_permission(Permission::Granted);
    assert_eq!(dispatcher.flush_pending(), 1);
    assert!(dispatcher.pending().is_empty());
    let batch = dispatcher.platform_mut().drain();
    assert_eq!(batch.system.len(), 1);
    assert_eq!(batch.system[0].body, "tea");
}

#[test]
fn deferred_notifications_drop_after_denial() {
    let mut dispatcher = NotificationDispatcher::new(Outbox::default());
    dispatcher.dispatch_due(&[due_reminder("1", "tea")], &offset());

    dispatcher.platform_mut().set_permission(Permission::Denied);
    assert_eq!(dispatcher.flush_pending(), 0);
    assert!(dispatcher.pending().is_empty());

    dispatcher.platform_mut().set_permission(Permission::Granted);
    assert_eq!(dispatcher.flush_pending(), 0);
    assert!(dispatcher.platform_mut().drain().system.is_empty());
}

#[test]
fn audio_failure_disables_cues_but_not_toasts() {
    let mut dispatcher =
        NotificationDispatcher::new(Outbox::new(Permission::Granted).without_audio());

    let report = dispatcher.dispatch_due(&[due_reminder("1", "tea")], &offset());

    assert_eq!(report.cues_played, 0);
    assert_eq!(report.toasts_shown, 1);
    assert!(!dispatcher.audio_enabled());
    let batch = dispatcher.platform_mut().drain();
    assert!(batch.cues.is_empty());
    assert_eq!(batch.system.len(), 1);
}

#[test]
fn completion_dismisses_sticky_toast_and_confirms() {
    let mut dispatcher = NotificationDispatcher::with_toast_duration(
        Outbox::new(Permission::Granted),
        Duration::from_millis(1500),
    );
    let reminder = due_reminder("9", "water plants");

    dispatcher.reminder_completed(&reminder);

    let batch = dispatcher.platform_mut().drain();
    assert_eq!(batch.cues, vec![Cue::Completion]);
    assert_eq!(batch.dismissed_toasts, vec![reminder_toast_id("9")]);
    assert_eq!(batch.toasts.len(), 1);
    assert_eq!(batch.toasts[0].kind, ToastKind::Success);
    assert_eq!(
        batch.toasts[0].auto_dismiss_after,
        Some(Duration::from_millis(1500))
    );
}

#[test]
fn clearing_nothing_is_silent() {
    let mut dispatcher = NotificationDispatcher::new(Outbox::new(Permission::Granted));

    dispatcher.reminders_cleared(0);
    assert!(dispatcher.platform().batch().is_empty());

    dispatcher.reminders_cleared(3);
    let batch = dispatcher.platform_mut().drain();
    assert_eq!(batch.toasts.len(), 1);
    assert_eq!(batch.toasts[0].kind, ToastKind::Info);
    assert_eq!(batch.toasts[0].title, "Cleared 3 reminders");
}
