use chrono::{DateTime, Duration, FixedOffset, TimeZone, Timelike, Utc};
use lumen_core::db::open_db_in_memory;
use lumen_core::{
    Clock, EngineError, ManualClock, Reminder, ReminderEngine, ReminderStore,
    ReminderValidationError, SqliteReminderStore, StoreError, StoreResult, VisualProgramId,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

fn local_start() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(2 * 3600)
        .expect("valid offset")
        .with_ymd_and_hms(2026, 4, 20, 14, 30, 20)
        .single()
        .expect("valid start")
}

/// In-memory store whose writes can be made to fail.
#[derive(Default)]
struct FlakyStore {
    saved: RefCell<Vec<Reminder>>,
    fail_writes: Cell<bool>,
    writes: Cell<usize>,
}

impl ReminderStore for FlakyStore {
    fn load_reminders(&self) -> StoreResult<Vec<Reminder>> {
        Ok(self.saved.borrow().clone())
    }

    fn save_reminders(&self, reminders: &[Reminder]) -> StoreResult<()> {
        if self.fail_writes.get() {
            return Err(StoreError::InvalidData("disk full".to_string()));
        }
        self.writes.set(self.writes.get() + 1);
        *self.saved.borrow_mut() = reminders.to_vec();
        Ok(())
    }

    fn load_selected_program(&self) -> StoreResult<Option<VisualProgramId>> {
        Ok(None)
    }

    fn save_selected_program(&self, _id: VisualProgramId) -> StoreResult<()> {
        Ok(())
    }
}

#[test]
fn inserting_many_reminders_yields_distinct_ids_within_one_millisecond() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");

    for index in 0..25 {
        engine
            .create(format!("item {index}"), clock.now() + Duration::hours(1))
            .expect("create should succeed");
    }

    let ids = engine
        .reminders()
        .iter()
        .map(|reminder| reminder.id.clone())
        .collect::<HashSet<_>>();
    assert_eq!(ids.len(), 25);
    assert_eq!(
        engine.reminders()[0].id,
        clock.now().timestamp_millis().to_string()
    );
}

#[test]
fn create_rejects_blank_message_without_persisting() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");

    let err = engine
        .create("  ", clock.now())
        .expect_err("blank message must fail");
    assert!(matches!(
        err,
        EngineError::Validation(ReminderValidationError::EmptyMessage)
    ));
    assert!(engine.reminders().is_empty());
    assert_eq!(store.writes.get(), 0);
}

#[test]
fn create_at_time_of_day_rejects_unparsable_time() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");

    let err = engine
        .create_at_time_of_day("stretch", "25:99")
        .expect_err("bad time must fail");
    assert!(matches!(
        err,
        EngineError::Validation(ReminderValidationError::InvalidTimeOfDay(_))
    ));
    assert!(engine.reminders().is_empty());
}

#[test]
fn scenario_a_reminder_due_in_three_minutes_is_upcoming_and_active() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");

    engine
        .create("Call Bob", clock.now() + Duration::minutes(3))
        .expect("create should succeed");

    assert!(engine.has_upcoming(5));
    assert!(engine.has_active());
}

#[test]
fn has_upcoming_window_is_exclusive_of_now_and_inclusive_of_limit() {
    let clock = ManualClock::new(local_start());
    let now = clock.now();
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");

    engine
        .create("past", now - Duration::minutes(1))
        .expect("create past");
    assert!(!engine.has_upcoming_at(now, 5));

    engine.create("exactly now", now).expect("create now");
    assert!(!engine.has_upcoming_at(now, 5));

    engine
        .create("far", now + Duration::minutes(5) + Duration::seconds(1))
        .expect("create far");
    assert!(!engine.has_upcoming_at(now, 5));

    engine
        .create("edge", now + Duration::minutes(5))
        .expect("create edge");
    assert!(engine.has_upcoming_at(now, 5));
}

#[test]
fn completed_reminders_are_never_upcoming() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");

    let reminder = engine
        .create("water plants", clock.now() + Duration::minutes(2))
        .expect("create should succeed");
    assert!(engine.complete(&reminder.id).expect("complete"));

    assert!(!engine.has_upcoming(5));
    assert!(!engine.has_active());
}

#[test]
fn scenario_b_due_check_fires_exactly_once() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");
    let reminder = engine
        .create("Call Bob", clock.now() + Duration::minutes(3))
        .expect("create should succeed");

    assert!(engine.due_check(clock.now()).is_empty());

    clock.advance(Duration::minutes(3) + Duration::seconds(1));
    let due = engine.due_check(clock.now());
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id, reminder.id);
    assert!(due[0].notified);

    assert!(engine.due_check(clock.now()).is_empty());
    clock.advance(Duration::hours(1));
    assert!(engine.due_check(clock.now()).is_empty());
    assert!(engine.get(&reminder.id).expect("still stored").notified);
}

#[test]
fn due_check_skips_completed_reminders() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");
    let reminder = engine
        .create("done early", clock.now() + Duration::minutes(1))
        .expect("create should succeed");
    engine.complete(&reminder.id).expect("complete");

    clock.advance(Duration::minutes(2));
    assert!(engine.due_check(clock.now()).is_empty());
    assert!(!engine.get(&reminder.id).expect("kept").notified);
}

#[test]
fn due_check_keeps_flags_when_write_fails() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");
    engine
        .create("flaky", clock.now() + Duration::seconds(30))
        .expect("create should succeed");

    store.fail_writes.set(true);
    clock.advance(Duration::minutes(1));
    assert_eq!(engine.due_check(clock.now()).len(), 1);
    assert!(engine.due_check(clock.now()).is_empty());
}

#[test]
fn complete_is_monotonic_and_reports_unknown_ids() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");
    let reminder = engine
        .create("stand up", clock.now() + Duration::minutes(10))
        .expect("create should succeed");

    assert!(engine.complete(&reminder.id).expect("first complete"));
    assert!(!engine.complete(&reminder.id).expect("second complete"));
    assert!(engine.get(&reminder.id).expect("kept").completed);
    assert!(!engine.complete("does-not-exist").expect("unknown id"));
}

#[test]
fn failed_write_rolls_back_create_and_complete() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");
    let reminder = engine
        .create("kept", clock.now() + Duration::minutes(10))
        .expect("create should succeed");

    store.fail_writes.set(true);
    assert!(matches!(
        engine.create("lost", clock.now() + Duration::minutes(20)),
        Err(EngineError::Store(_))
    ));
    assert_eq!(engine.reminders().len(), 1);

    assert!(engine.complete(&reminder.id).is_err());
    assert!(!engine.get(&reminder.id).expect("kept").completed);

    assert!(engine.clear_incomplete().is_err());
    assert_eq!(engine.active_count(), 1);
}

#[test]
fn scenario_c_clear_incomplete_removes_active_and_keeps_completed() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");
    let finished = engine
        .create("finished", clock.now() + Duration::minutes(1))
        .expect("create");
    engine.complete(&finished.id).expect("complete");
    engine
        .create("first", clock.now() + Duration::minutes(30))
        .expect("create");
    engine
        .create("second", clock.now() + Duration::minutes(40))
        .expect("create");

    assert_eq!(engine.clear_incomplete().expect("clear"), 2);
    assert!(engine.active_reminders().is_empty());
    assert_eq!(engine.reminders().len(), 1);
    assert_eq!(engine.reminders()[0].id, finished.id);

    let writes_before = store.writes.get();
    assert_eq!(engine.clear_incomplete().expect("second clear"), 0);
    assert_eq!(store.writes.get(), writes_before);
}

#[test]
fn active_reminders_keep_insertion_order() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");
    for message in ["a", "b", "c"] {
        engine
            .create(message, clock.now() + Duration::hours(2))
            .expect("create");
    }
    let b_id = engine.reminders()[1].id.clone();
    engine.complete(&b_id).expect("complete");

    let messages = engine
        .active_reminders()
        .into_iter()
        .map(|reminder| reminder.message.as_str())
        .collect::<Vec<_>>();
    assert_eq!(messages, vec!["a", "c"]);
}

#[test]
fn scenario_d_earlier_time_of_day_moves_to_next_day() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");

    let reminder = engine
        .create_at_time_of_day("morning run", "09:15")
        .expect("create should succeed");

    let local_due = reminder.due_at.with_timezone(clock.now_local().offset());
    assert_eq!((local_due.hour(), local_due.minute(), local_due.second()), (9, 15, 0));
    assert_eq!(
        local_due.date_naive(),
        clock.now_local().date_naive().succ_opt().expect("next day")
    );
}

#[test]
fn later_time_of_day_stays_today() {
    let clock = ManualClock::new(local_start());
    let store = FlakyStore::default();
    let mut engine = ReminderEngine::load(&store, &clock).expect("engine should load");

    let reminder = engine
        .create_at_time_of_day("tea", "16:00")
        .expect("create should succeed");

    let expected = Utc
        .with_ymd_and_hms(2026, 4, 20, 14, 0, 0)
        .single()
        .expect("valid expected");
    assert_eq!(reminder.due_at, expected);
}

#[test]
fn mutations_are_durable_across_reload() {
    let conn = open_db_in_memory().expect("open db");
    let clock = ManualClock::new(local_start());

    let created_id = {
        let store = SqliteReminderStore::new(&conn);
        let mut engine = ReminderEngine::load(store, &clock).expect("load");
        let first = engine
            .create("persist me", clock.now() + Duration::minutes(1))
            .expect("create");
        engine
            .create("and me", clock.now() + Duration::minutes(90))
            .expect("create");
        clock.advance(Duration::minutes(2));
        assert_eq!(engine.due_check(clock.now()).len(), 1);
        engine.complete(&first.id).expect("complete");
        first.id
    };

    let store = SqliteReminderStore::new(&conn);
    let engine = ReminderEngine::load(store, &clock).expect("reload");
    assert_eq!(engine.reminders().len(), 2);
    let first = engine.get(&created_id).expect("first reloaded");
    assert!(first.completed);
    assert!(first.notified);
    assert_eq!(engine.active_count(), 1);
}
