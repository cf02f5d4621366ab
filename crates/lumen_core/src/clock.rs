//! Wall-clock abstraction.
//!
//! The engine resolves "HH:MM" submissions in the host's local offset, so the
//! clock reports local time and UTC is derived from it.

use chrono::{DateTime, Duration, FixedOffset, Local, Utc};
use std::cell::Cell;

/// Source of "now" for reminder scheduling.
pub trait Clock {
    /// Current time in the host's local offset.
    fn now_local(&self) -> DateTime<FixedOffset>;

    fn now(&self) -> DateTime<Utc> {
        self.now_local().with_timezone(&Utc)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_local(&self) -> DateTime<FixedOffset> {
        (**self).now_local()
    }
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_local(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Manually advanced clock for tests and replay.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now_local(&self) -> DateTime<FixedOffset> {
        self.now.get()
    }
}
