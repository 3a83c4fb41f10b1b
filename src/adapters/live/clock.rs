//! Wall-clock time for cache expiry.

use chrono::{DateTime, Utc};

use crate::ports::clock::Clock;

/// Reads UTC time from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
