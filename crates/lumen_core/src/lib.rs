//! Core domain logic for the Lumen reminder widget.
//! This crate is the single source of truth for reminder invariants.

pub mod app;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod render;
pub mod repo;
pub mod schedule;
pub mod service;

pub use app::{ReminderWidget, TickReport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, WidgetConfig};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::program::{VisualProgram, VisualProgramId};
pub use model::reminder::{Reminder, ReminderId, ReminderValidationError};
pub use notify::dispatcher::{DispatchReport, NotificationDispatcher};
pub use notify::outbox::{Outbox, OutboxBatch};
pub use notify::{
    Cue, NotificationPlatform, Permission, PlatformError, SystemNotification, Toast, ToastAction,
    ToastKind,
};
pub use render::canvas::{GraphicsContext, GraphicsError, SoftwareCanvas};
pub use render::math::Vec2;
pub use render::render_loop::RenderLoop;
pub use render::shading::FrameUniforms;
pub use repo::reminder_store::{ReminderStore, SqliteReminderStore, StoreError, StoreResult};
pub use service::reminder_engine::{
    default_time_of_day, EngineError, EngineResult, ReminderEngine,
};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
