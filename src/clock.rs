//! Time sources.
//!
//! Everything that reads the time goes through [`Clock`] so deadlines and
//! profiling durations can be driven by hand in tests.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

pub trait Clock: Send + Sync {
    /// Monotonic instant used for deadlines and elapsed-time measurement.
    fn now(&self) -> Instant;

    /// Wall-clock time, only used for human readable timestamps.
    fn wall_time(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Both readings advance together, so a test that calls
/// [`FakeClock::advance`] sees the same elapsed time on the monotonic and the
/// wall-clock side.
#[derive(Debug)]
pub struct FakeClock {
    origin: Instant,
    wall_origin: DateTime<Utc>,
    elapsed: Mutex<Duration>,
}

impl FakeClock {
    pub fn new(wall_origin: DateTime<Utc>) -> Self {
        FakeClock {
            origin: Instant::now(),
            wall_origin,
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.origin + *self.elapsed.lock()
    }

    fn wall_time(&self) -> DateTime<Utc> {
        // chrono::TimeDelta::from_std only fails past ~292 billion years
        let elapsed = chrono::TimeDelta::from_std(*self.elapsed.lock()).unwrap_or_default();
        self.wall_origin + elapsed
    }
}
