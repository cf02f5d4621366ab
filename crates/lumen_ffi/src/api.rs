//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level reminder and visual-program functions to
//!   Dart via FRB.
//! - Translate core notifications into plain envelopes the host renders.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens the configured database, so the host holds no core
//!   state between calls.
//! - System notifications deferred on an undetermined permission are handed
//!   back to the host instead of being queued in Rust.

use chrono::Utc;
use lumen_core::db::open_db;
use lumen_core::notify::dispatcher::format_due_label;
use lumen_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Clock, FrameUniforms, NotificationDispatcher, Outbox, OutboxBatch, Permission, Reminder,
    ReminderEngine, ReminderStore, SqliteReminderStore, SystemClock, SystemNotification, Toast,
    ToastAction, ToastKind, Vec2, VisualProgramId, WidgetConfig,
};
use std::sync::OnceLock;

static WIDGET_CONFIG: OnceLock<WidgetConfig> = OnceLock::new();

type FfiEngine<'conn> = ReminderEngine<SqliteReminderStore<'conn>, SystemClock>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Reminder projection for list and due-check responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderItem {
    pub id: String,
    pub message: String,
    /// Due instant as epoch milliseconds (UTC).
    pub due_at_epoch_ms: i64,
    /// Due time as local `HH:MM`.
    pub due_label: String,
    pub completed: bool,
    pub notified: bool,
}

/// Toast request the host renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastItem {
    pub id: String,
    /// `success|info|error|reminder`.
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    /// `None` keeps the toast until dismissed.
    pub auto_dismiss_ms: Option<u32>,
    /// Set when the toast carries a mark-complete action.
    pub complete_reminder_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemNotificationItem {
    pub title: String,
    pub body: String,
}

/// Everything the host should present after one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationBatch {
    /// Cue names (`notification|confirmation|completion`) in play order.
    pub cues: Vec<String>,
    pub toasts: Vec<ToastItem>,
    pub dismissed_toast_ids: Vec<String>,
    /// Send immediately.
    pub system: Vec<SystemNotificationItem>,
    /// Send only if the pending permission prompt is granted.
    pub deferred_system: Vec<SystemNotificationItem>,
    /// Host should show its permission prompt.
    pub permission_requested: bool,
}

/// Generic action response envelope for reminder commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected reminder ID when one applies.
    pub reminder_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    pub notifications: NotificationBatch,
}

impl ReminderActionResponse {
    fn success(message: impl Into<String>, reminder_id: Option<String>, outbox: Outbox) -> Self {
        Self {
            ok: true,
            reminder_id,
            message: message.into(),
            notifications: to_batch(outbox, &[]),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            reminder_id: None,
            message: message.into(),
            notifications: NotificationBatch::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderListResponse {
    /// Active reminders in insertion order.
    pub items: Vec<ReminderItem>,
    pub has_active: bool,
    pub has_upcoming: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueCheckResponse {
    pub ok: bool,
    /// Reminders that became due during this call.
    pub due: Vec<ReminderItem>,
    pub notifications: NotificationBatch,
    pub message: String,
}

/// Shader sources for one visual program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramResponse {
    pub ok: bool,
    /// Program number `1..=4`.
    pub id: u32,
    pub name: String,
    pub vertex_source: String,
    pub fragment_source: String,
    pub message: String,
}

/// Per-frame uniform values for a host-side shader pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniformsResponse {
    pub time: f32,
    pub pointer_x: f32,
    pub pointer_y: f32,
    pub has_active: bool,
    pub has_upcoming: bool,
}

/// Creates a reminder from message + local `HH:MM` input.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns the created reminder ID plus confirmation cue/toast on success.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_create(message: String, time_of_day: String) -> ReminderActionResponse {
    let result = with_engine(|engine| {
        let reminder = engine
            .create_at_time_of_day(message.as_str(), time_of_day.as_str())
            .map_err(|err| err.to_string())?;
        let offset = *engine.clock().now_local().offset();
        let mut dispatcher = feedback_dispatcher();
        dispatcher.reminder_created(&reminder, &offset);
        Ok((reminder.id, dispatcher))
    });
    match result.and_then(|inner| inner) {
        Ok((id, dispatcher)) => {
            ReminderActionResponse::success("Reminder set.", Some(id), into_outbox(dispatcher))
        }
        Err(err) => ReminderActionResponse::failure(format!("reminder_create failed: {err}")),
    }
}

/// Marks one reminder completed.
///
/// Unknown or already-completed IDs return `ok=false` without side effects.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_complete(reminder_id: String) -> ReminderActionResponse {
    let result = with_engine(|engine| {
        let changed = engine
            .complete(reminder_id.as_str())
            .map_err(|err| err.to_string())?;
        if !changed {
            return Ok(None);
        }
        let mut dispatcher = feedback_dispatcher();
        if let Some(reminder) = engine.get(reminder_id.as_str()) {
            dispatcher.reminder_completed(reminder);
        }
        Ok(Some(dispatcher))
    });
    match result.and_then(|inner| inner) {
        Ok(Some(dispatcher)) => ReminderActionResponse::success(
            "Reminder completed.",
            Some(reminder_id),
            into_outbox(dispatcher),
        ),
        Ok(None) => ReminderActionResponse::failure(format!(
            "reminder_complete: no active reminder `{reminder_id}`"
        )),
        Err(err) => ReminderActionResponse::failure(format!("reminder_complete failed: {err}")),
    }
}

/// Removes every incomplete reminder.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_clear_incomplete() -> ReminderActionResponse {
    let result = with_engine(|engine| {
        let removed = engine.clear_incomplete().map_err(|err| err.to_string())?;
        let mut dispatcher = feedback_dispatcher();
        dispatcher.reminders_cleared(removed);
        Ok((removed, dispatcher))
    });
    match result.and_then(|inner| inner) {
        Ok((removed, dispatcher)) => ReminderActionResponse::success(
            format!("Cleared {removed} reminder(s)."),
            None,
            into_outbox(dispatcher),
        ),
        Err(err) => {
            ReminderActionResponse::failure(format!("reminders_clear_incomplete failed: {err}"))
        }
    }
}

/// Lists active reminders with the two render flags.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_active() -> ReminderListResponse {
    let window = widget_config().upcoming_window_minutes;
    let result = with_engine(|engine| {
        let offset = *engine.clock().now_local().offset();
        let items = engine
            .active_reminders()
            .into_iter()
            .map(|reminder| to_reminder_item(reminder, &offset))
            .collect::<Vec<_>>();
        (items, engine.has_upcoming(window))
    });
    match result {
        Ok((items, has_upcoming)) => ReminderListResponse {
            has_active: !items.is_empty(),
            has_upcoming,
            message: format!("{} active reminder(s).", items.len()),
            items,
        },
        Err(err) => ReminderListResponse {
            items: Vec::new(),
            has_active: false,
            has_upcoming: false,
            message: format!("reminders_active failed: {err}"),
        },
    }
}

/// Runs one due-check and returns what the host should present.
///
/// Input semantics:
/// - `permission`: current platform notification permission
///   (`granted|denied`, anything else is undetermined).
///
/// # FFI contract
/// - Each due reminder is reported by exactly one call.
/// - With an undetermined permission the batch asks for a prompt and the
///   system notifications come back in `deferred_system`.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_due_check(permission: String) -> DueCheckResponse {
    let permission = Permission::parse(permission.as_str());
    let result = with_engine(|engine| {
        let due = engine.due_check(Utc::now());
        let offset = *engine.clock().now_local().offset();
        let mut dispatcher = NotificationDispatcher::with_toast_duration(
            Outbox::new(permission),
            widget_config().toast_duration,
        );
        dispatcher.dispatch_due(&due, &offset);
        let deferred = dispatcher.pending().to_vec();
        let items = due
            .iter()
            .map(|reminder| to_reminder_item(reminder, &offset))
            .collect::<Vec<_>>();
        (items, to_batch(into_outbox(dispatcher), &deferred))
    });
    match result {
        Ok((due, notifications)) => DueCheckResponse {
            ok: true,
            message: format!("{} reminder(s) due.", due.len()),
            due,
            notifications,
        },
        Err(err) => DueCheckResponse {
            ok: false,
            due: Vec::new(),
            notifications: NotificationBatch::default(),
            message: format!("reminders_due_check failed: {err}"),
        },
    }
}

/// Returns the persisted program selection with its shader sources.
#[flutter_rust_bridge::frb(sync)]
pub fn program_selected() -> ProgramResponse {
    let selected = with_store(|store| store.load_selected_program().map_err(|err| err.to_string()));
    match selected.and_then(|inner| inner) {
        Ok(selected) => to_program_response(selected.unwrap_or_default(), "Program loaded."),
        Err(err) => to_program_response(
            VisualProgramId::default(),
            format!("program_selected fell back to default: {err}"),
        ),
    }
}

/// Persists a program selection (`1..=4`) and returns its shader sources.
///
/// Out-of-range IDs return `ok=false` and leave the selection unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn program_select(program_id: u32) -> ProgramResponse {
    let Some(program) = VisualProgramId::from_number(program_id) else {
        return ProgramResponse {
            ok: false,
            id: program_id,
            name: String::new(),
            vertex_source: String::new(),
            fragment_source: String::new(),
            message: format!("program_select: unknown program `{program_id}`; expected 1-4"),
        };
    };
    let saved = with_store(|store| {
        store
            .save_selected_program(program)
            .map_err(|err| err.to_string())
    });
    match saved.and_then(|inner| inner) {
        Ok(()) => to_program_response(program, "Program selected."),
        Err(err) => ProgramResponse {
            ok: false,
            ..to_program_response(program, format!("program_select failed: {err}"))
        },
    }
}

/// Builds frame uniforms from host timing and pointer input.
///
/// Input semantics:
/// - `elapsed_seconds`: seconds since the host's render loop started.
/// - `pointer_*`/`surface_*`: pointer position in surface pixels, top-left origin.
///
/// # FFI contract
/// - Reads reminder flags from the database on every call; hosts should call
///   it once per frame at most.
/// - An empty surface keeps the pointer centred.
#[flutter_rust_bridge::frb(sync)]
pub fn frame_uniforms(
    elapsed_seconds: f32,
    pointer_x: f32,
    pointer_y: f32,
    surface_width: f32,
    surface_height: f32,
) -> FrameUniformsResponse {
    let window = widget_config().upcoming_window_minutes;
    let (has_active, has_upcoming) = with_engine(|engine| {
        (engine.has_active(), engine.has_upcoming(window))
    })
    .unwrap_or_else(|err| {
        log::warn!("event=frame_uniforms module=ffi status=degraded error={err}");
        (false, false)
    });
    let uniforms = FrameUniforms {
        time: elapsed_seconds.max(0.0),
        pointer: Vec2::from_surface(pointer_x, pointer_y, surface_width, surface_height)
            .unwrap_or(Vec2::CENTER),
        has_active,
        has_upcoming,
    };
    FrameUniformsResponse {
        time: uniforms.time,
        pointer_x: uniforms.pointer.x,
        pointer_y: uniforms.pointer.y,
        has_active: uniforms.has_active,
        has_upcoming: uniforms.has_upcoming,
    }
}

fn widget_config() -> &'static WidgetConfig {
    WIDGET_CONFIG.get_or_init(WidgetConfig::from_env)
}

fn with_store<T>(f: impl FnOnce(&SqliteReminderStore<'_>) -> T) -> Result<T, String> {
    let conn = open_db(&widget_config().db_path)
        .map_err(|err| format!("reminder DB open failed: {err}"))?;
    let store = SqliteReminderStore::new(&conn);
    Ok(f(&store))
}

fn with_engine<T>(f: impl FnOnce(&mut FfiEngine<'_>) -> T) -> Result<T, String> {
    let conn = open_db(&widget_config().db_path)
        .map_err(|err| format!("reminder DB open failed: {err}"))?;
    let mut engine = ReminderEngine::load(SqliteReminderStore::new(&conn), SystemClock)
        .map_err(|err| format!("reminder load failed: {err}"))?;
    Ok(f(&mut engine))
}

fn feedback_dispatcher() -> NotificationDispatcher<Outbox> {
    NotificationDispatcher::with_toast_duration(
        Outbox::new(Permission::Undetermined),
        widget_config().toast_duration,
    )
}

fn into_outbox(mut dispatcher: NotificationDispatcher<Outbox>) -> Outbox {
    std::mem::take(dispatcher.platform_mut())
}

fn to_batch(mut outbox: Outbox, deferred: &[SystemNotification]) -> NotificationBatch {
    let OutboxBatch {
        cues,
        toasts,
        dismissed_toasts,
        system,
        permission_requested,
    } = outbox.drain();
    NotificationBatch {
        cues: cues.into_iter().map(|cue| cue.as_str().to_string()).collect(),
        toasts: toasts.iter().map(to_toast_item).collect(),
        dismissed_toast_ids: dismissed_toasts,
        system: system.iter().map(to_system_item).collect(),
        deferred_system: deferred.iter().map(to_system_item).collect(),
        permission_requested,
    }
}

fn to_reminder_item(reminder: &Reminder, offset: &chrono::FixedOffset) -> ReminderItem {
    ReminderItem {
        id: reminder.id.clone(),
        message: reminder.message.clone(),
        due_at_epoch_ms: reminder.due_at.timestamp_millis(),
        due_label: format_due_label(reminder, offset),
        completed: reminder.completed,
        notified: reminder.notified,
    }
}

fn to_toast_item(toast: &Toast) -> ToastItem {
    ToastItem {
        id: toast.id.clone(),
        kind: toast_kind_label(toast.kind).to_string(),
        title: toast.title.clone(),
        description: toast.description.clone(),
        auto_dismiss_ms: toast
            .auto_dismiss_after
            .map(|duration| u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)),
        complete_reminder_id: toast.action.as_ref().map(|action| match action {
            ToastAction::MarkComplete { reminder_id } => reminder_id.clone(),
        }),
    }
}

fn to_system_item(notification: &SystemNotification) -> SystemNotificationItem {
    SystemNotificationItem {
        title: notification.title.clone(),
        body: notification.body.clone(),
    }
}

fn toast_kind_label(kind: ToastKind) -> &'static str {
    match kind {
        ToastKind::Success => "success",
        ToastKind::Info => "info",
        ToastKind::Error => "error",
        ToastKind::Reminder => "reminder",
    }
}

fn to_program_response(program: VisualProgramId, message: impl Into<String>) -> ProgramResponse {
    let source = program.program();
    ProgramResponse {
        ok: true,
        id: program.number(),
        name: source.name.to_string(),
        vertex_source: source.vertex_source.to_string(),
        fragment_source: source.fragment_source.to_string(),
        message: message.into(),
    }
}
