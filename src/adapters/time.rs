//! System clock adapter.
//!
//! Provides wall-clock seconds for `settings-date` and monotonic uptime
//! for the main loop.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::app::ports::ClockPort;

/// Clock backed by the host's system time.
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since construction (monotonic).
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}

impl ClockPort for SystemClock {
    /// Seconds since the Unix epoch, `0` if the clock is set before it.
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}
