use chrono::{DateTime, Utc};
use std::fmt;

/// Whole seconds left on a reservation, floored, never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Countdown {
    secs: u64,
}

impl Countdown {
    pub const ZERO: Countdown = Countdown { secs: 0 };

    pub fn from_secs(secs: u64) -> Self {
        Self { secs }
    }

    /// `max(0, floor((expiry - now) / 1s))`
    pub fn until(expiry: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let millis = (expiry - now).num_milliseconds();
        if millis <= 0 {
            return Self::ZERO;
        }
        Self {
            secs: (millis / 1000) as u64,
        }
    }

    pub fn as_secs(&self) -> u64 {
        self.secs
    }

    pub fn is_zero(&self) -> bool {
        self.secs == 0
    }

    pub fn minutes(&self) -> u64 {
        self.secs / 60
    }

    pub fn seconds(&self) -> u64 {
        self.secs % 60
    }
}

/// Formats as `M:SS`.
impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.minutes(), self.seconds())
    }
}
