//! Reminder widget composition root.
//!
//! # Responsibility
//! - Construct engine, dispatcher, render loop and timers at startup.
//! - Expose the user-facing commands and the cooperative `tick`/`render_frame`
//!   entry points a host calls from its single loop.
//!
//! # Invariants
//! - Every mutation is persisted before cues, toasts or render flags read the
//!   new state.
//! - No failure stops the widget: storage, audio, graphics and permission
//!   problems each degrade one feature.
//! - The carousel timer runs only while more than one reminder is active.

use crate::clock::Clock;
use crate::config::WidgetConfig;
use crate::model::program::VisualProgramId;
use crate::model::reminder::Reminder;
use crate::notify::dispatcher::{DispatchReport, NotificationDispatcher};
use crate::notify::NotificationPlatform;
use crate::render::canvas::GraphicsContext;
use crate::render::render_loop::RenderLoop;
use crate::render::shading::FrameUniforms;
use crate::repo::reminder_store::{ReminderStore, StoreError};
use crate::schedule::IntervalTimer;
use crate::service::carousel::Carousel;
use crate::service::reminder_engine::{EngineError, EngineResult, ReminderEngine};
use chrono::{DateTime, Utc};
use log::{error, info, warn};

/// What one `tick` did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Reminders that became due during this tick.
    pub due: Vec<Reminder>,
    pub dispatch: DispatchReport,
    /// Deferred system notifications sent now that permission is granted.
    pub deferred_sent: usize,
    pub carousel_rotated: bool,
}

pub struct ReminderWidget<S, C, P, G>
where
    S: ReminderStore,
    C: Clock,
    P: NotificationPlatform,
    G: GraphicsContext,
{
    engine: ReminderEngine<S, C>,
    dispatcher: NotificationDispatcher<P>,
    render: RenderLoop<G>,
    due_timer: IntervalTimer,
    carousel: Carousel,
    upcoming_window_minutes: i64,
}

impl<S, C, P, G> ReminderWidget<S, C, P, G>
where
    S: ReminderStore,
    C: Clock,
    P: NotificationPlatform,
    G: GraphicsContext,
{
    /// Loads persisted state and starts the widget.
    ///
    /// Unreadable stored data is logged and replaced by defaults (empty
    /// collection, first program) rather than failing startup.
    pub fn start(
        store: S,
        clock: C,
        platform: P,
        graphics: Option<G>,
        config: &WidgetConfig,
    ) -> Self {
        let selected = match store.load_selected_program() {
            Ok(selected) => selected.unwrap_or_default(),
            Err(err) => {
                warn!("event=widget_start module=app status=degraded reason=selection_unreadable error={err}");
                VisualProgramId::default()
            }
        };
        let reminders = match store.load_reminders() {
            Ok(reminders) => reminders,
            Err(err) => {
                error!("event=widget_start module=app status=degraded reason=reminders_unreadable error={err}");
                Vec::new()
            }
        };

        let now = clock.now();
        let engine = ReminderEngine::with_reminders(store, clock, reminders);
        let mut due_timer = IntervalTimer::new(config.due_check_interval);
        due_timer.start(now);
        let mut carousel = Carousel::new(config.carousel_interval);
        carousel.sync(
            engine
                .active_reminders()
                .into_iter()
                .map(|reminder| reminder.id.as_str()),
            now,
        );

        info!(
            "event=widget_start module=app status=ok program={} reminders={} active={}",
            selected.number(),
            engine.reminders().len(),
            engine.active_count()
        );

        Self {
            engine,
            dispatcher: NotificationDispatcher::with_toast_duration(platform, config.toast_duration),
            render: RenderLoop::new(graphics, selected),
            due_timer,
            carousel,
            upcoming_window_minutes: config.upcoming_window_minutes,
        }
    }

    pub fn engine(&self) -> &ReminderEngine<S, C> {
        &self.engine
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher<P> {
        &self.dispatcher
    }

    pub fn platform_mut(&mut self) -> &mut P {
        self.dispatcher.platform_mut()
    }

    pub fn render(&self) -> &RenderLoop<G> {
        &self.render
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    pub fn has_active(&self) -> bool {
        self.engine.has_active()
    }

    pub fn has_upcoming(&self) -> bool {
        self.engine.has_upcoming(self.upcoming_window_minutes)
    }

    /// Active reminder currently shown by the carousel.
    pub fn current_reminder(&self) -> Option<&Reminder> {
        self.carousel.current().and_then(|id| self.engine.get(id))
    }

    /// Creates a reminder from message + `HH:MM` input.
    ///
    /// # Errors
    /// - Validation errors abort without creating anything.
    /// - Store errors are also shown to the user as an error toast.
    pub fn submit_reminder(&mut self, message: &str, time_text: &str) -> EngineResult<Reminder> {
        let reminder = match self.engine.create_at_time_of_day(message, time_text) {
            Ok(reminder) => reminder,
            Err(err) => {
                if let EngineError::Store(store_err) = &err {
                    self.report_store_error("Reminder not saved", store_err);
                }
                return Err(err);
            }
        };
        self.sync_carousel();
        let offset = *self.engine.clock().now_local().offset();
        self.dispatcher.reminder_created(&reminder, &offset);
        Ok(reminder)
    }

    /// Marks a reminder complete. Unknown or finished ids return `false`.
    pub fn mark_complete(&mut self, id: &str) -> bool {
        match self.engine.complete(id) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(err) => {
                if let EngineError::Store(store_err) = &err {
                    self.report_store_error("Reminder not updated", store_err);
                }
                return false;
            }
        }
        self.sync_carousel();
        if let Some(reminder) = self.engine.get(id).cloned() {
            self.dispatcher.reminder_completed(&reminder);
        }
        true
    }

    /// Completes the reminder the carousel is showing.
    pub fn mark_current_complete(&mut self) -> bool {
        let Some(id) = self.current_reminder().map(|reminder| reminder.id.clone()) else {
            return false;
        };
        self.mark_complete(id.as_str())
    }

    /// Removes all incomplete reminders; returns how many went.
    pub fn clear_incomplete(&mut self) -> usize {
        match self.engine.clear_incomplete() {
            Ok(count) => {
                self.sync_carousel();
                self.dispatcher.reminders_cleared(count);
                count
            }
            Err(err) => {
                if let EngineError::Store(store_err) = &err {
                    self.report_store_error("Reminders not cleared", store_err);
                }
                0
            }
        }
    }

    /// Persists and activates a visual program.
    pub fn select_program(&mut self, program: VisualProgramId) {
        if let Err(err) = self.engine.store().save_selected_program(program) {
            warn!(
                "event=program_select module=app status=degraded program={} error={err}",
                program.number()
            );
        }
        self.render.select_program(program);
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.render.pointer_moved(x, y, width, height);
    }

    /// Runs whichever timers are due at `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();

        if self.due_timer.poll(now) {
            report.due = self.engine.due_check(now);
            if !report.due.is_empty() {
                let offset = *self.engine.clock().now_local().offset();
                report.dispatch = self.dispatcher.dispatch_due(&report.due, &offset);
            }
        }
        report.deferred_sent = self.dispatcher.flush_pending();
        report.carousel_rotated = self.carousel.poll(now);
        report
    }

    /// Draws one frame with the current reminder flags.
    pub fn render_frame(&mut self, now: DateTime<Utc>) -> Option<FrameUniforms> {
        let has_active = self.engine.has_active();
        let has_upcoming = self.engine.has_upcoming_at(now, self.upcoming_window_minutes);
        self.render.frame(now, has_active, has_upcoming)
    }

    fn sync_carousel(&mut self) {
        let now = self.engine.clock().now();
        self.carousel.sync(
            self.engine
                .active_reminders()
                .into_iter()
                .map(|reminder| reminder.id.as_str()),
            now,
        );
    }

    fn report_store_error(&mut self, title: &str, err: &StoreError) {
        self.dispatcher.report_error(title, err.to_string());
    }
}
