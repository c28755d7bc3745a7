#![forbid(unsafe_code)]

//! Injectable wall clock.
//!
//! The unsaved-changes guard compares "now" against a deadline derived from
//! HTTP headers, and the timer queue schedules against the same source.
//! Production pages use [`SystemClock`]; tests drive a [`ManualClock`].

use std::cell::Cell;
use std::time::Duration;

use web_time::{SystemTime, UNIX_EPOCH};

/// Source of the current time.
pub trait Clock {
    /// Current wall-clock time.
    fn now(&self) -> SystemTime;
}

/// Clock backed by the platform (works on wasm via `web-time`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<SystemTime>,
}

impl ManualClock {
    /// Start at `start`.
    #[must_use]
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Start at `secs` seconds after the Unix epoch.
    #[must_use]
    pub fn at_unix(secs: u64) -> Self {
        Self::new(UNIX_EPOCH + Duration::from_secs(secs))
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to `to`.
    pub fn set(&self, to: SystemTime) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.now.get()
    }
}

/// Seconds since the Unix epoch, negative before it.
#[must_use]
pub fn unix_seconds(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_secs()).unwrap_or(i64::MAX),
        Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
    }
}

/// Instant `secs` seconds after the Unix epoch (before it when negative).
#[must_use]
pub fn from_unix_seconds(secs: i64) -> SystemTime {
    if secs >= 0 {
        UNIX_EPOCH + Duration::from_secs(secs.unsigned_abs())
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
    }
}
