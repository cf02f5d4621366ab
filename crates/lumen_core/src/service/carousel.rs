//! Active-reminder carousel.
//!
//! Shows one active reminder at a time and rotates every period while more
//! than one is active. The rotation timer is cancelled and restarted whenever
//! the active cardinality changes.
//!
//! The carousel tracks ids, not positions: after a sync it keeps showing the
//! same reminder if that reminder is still active. When the shown reminder
//! leaves the set, the one that slid into its slot takes over.

use crate::model::reminder::ReminderId;
use crate::schedule::IntervalTimer;
use chrono::{DateTime, Duration, Utc};
use log::debug;

#[derive(Debug, Clone)]
pub struct Carousel {
    ids: Vec<ReminderId>,
    index: usize,
    timer: IntervalTimer,
}

impl Carousel {
    pub fn new(period: Duration) -> Self {
        Self {
            ids: Vec::new(),
            index: 0,
            timer: IntervalTimer::new(period),
        }
    }

    /// Index into the active reminders currently on display.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Id of the reminder on display, if any is active.
    pub fn current(&self) -> Option<&str> {
        self.ids.get(self.index).map(String::as_str)
    }

    pub fn is_rotating(&self) -> bool {
        self.timer.is_running()
    }

    /// Reconciles with the active reminder ids, in display order.
    pub fn sync<'a, I>(&mut self, active_ids: I, now: DateTime<Utc>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ids = active_ids
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        if ids == self.ids {
            return;
        }

        let previous_count = self.ids.len();
        let shown = self.current().map(str::to_string);
        self.index = match shown.and_then(|id| ids.iter().position(|candidate| *candidate == id)) {
            Some(position) => position,
            None if ids.is_empty() => 0,
            None => self.index % ids.len(),
        };
        self.ids = ids;

        if self.ids.len() == previous_count {
            return;
        }
        if self.ids.len() > 1 {
            self.timer.start(now);
        } else {
            self.timer.cancel();
        }
        debug!(
            "event=carousel_sync module=carousel active_count={} rotating={}",
            self.ids.len(),
            self.timer.is_running()
        );
    }

    /// Advances the display index when the rotation timer fires.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        if self.ids.len() <= 1 || !self.timer.poll(now) {
            return false;
        }
        self.index = (self.index + 1) % self.ids.len();
        true
    }
}
