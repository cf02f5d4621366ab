//! Cooperative interval timers.
//!
//! # Responsibility
//! - Model the widget's periodic tasks without threads: the host calls
//!   `poll(now)` from its single loop and runs the task when it returns true.
//!
//! # Invariants
//! - A stopped timer never fires.
//! - One `poll` fires at most once; a loop that fell behind re-anchors to
//!   `now + period` instead of firing a burst of catch-up ticks.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTimer {
    period: Duration,
    next_fire: Option<DateTime<Utc>>,
}

impl IntervalTimer {
    /// Creates a stopped timer.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_fire: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// (Re)starts the timer so the first fire is one period after `now`.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.next_fire = Some(now + self.period);
    }

    pub fn cancel(&mut self) {
        self.next_fire = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_fire.is_some()
    }

    pub fn next_fire(&self) -> Option<DateTime<Utc>> {
        self.next_fire
    }

    /// Returns whether the task should run at `now`, rescheduling if so.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        let Some(next) = self.next_fire else {
            return false;
        };
        if now < next {
            return false;
        }
        let following = next + self.period;
        self.next_fire = Some(if following <= now {
            now + self.period
        } else {
            following
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::IntervalTimer;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn stopped_timer_never_fires() {
        let mut timer = IntervalTimer::new(Duration::seconds(1));
        assert!(!timer.poll(t0() + Duration::hours(1)));
    }

    #[test]
    fn fires_once_per_period() {
        let mut timer = IntervalTimer::new(Duration::seconds(1));
        timer.start(t0());
        assert!(!timer.poll(t0() + Duration::milliseconds(999)));
        assert!(timer.poll(t0() + Duration::milliseconds(1000)));
        assert!(!timer.poll(t0() + Duration::milliseconds(1500)));
        assert!(timer.poll(t0() + Duration::milliseconds(2000)));
    }

    #[test]
    fn late_poll_reanchors_instead_of_bursting() {
        let mut timer = IntervalTimer::new(Duration::seconds(1));
        timer.start(t0());
        let late = t0() + Duration::seconds(10);
        assert!(timer.poll(late));
        assert!(!timer.poll(late));
        assert_eq!(timer.next_fire(), Some(late + Duration::seconds(1)));
    }

    #[test]
    fn cancel_stops_future_fires() {
        let mut timer = IntervalTimer::new(Duration::seconds(5));
        timer.start(t0());
        timer.cancel();
        assert!(!timer.is_running());
        assert!(!timer.poll(t0() + Duration::seconds(5)));
    }
}
