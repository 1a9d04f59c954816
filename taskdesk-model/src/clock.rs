//! Time sources for audit stamping.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Source of the timestamp written into audit fields.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock that advances by a fixed step on every reading.
///
/// Each call to [`Clock::now`] returns a strictly later instant than the
/// previous one as long as `step` is positive.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    /// Creates a clock whose first reading is `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }

    /// Returns the instant the next reading will produce, without advancing.
    #[must_use]
    pub fn peek(&self) -> DateTime<Utc> {
        *self.next.lock()
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = self.next.lock();
        let current = *next;
        *next = current + self.step;
        current
    }
}
