//! Time source for issuance and expiry checks.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Supplies the current time in the configured time zone.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Tz>;

    /// Current instant as Unix epoch seconds.
    fn timestamp(&self) -> i64 {
        self.now().timestamp()
    }
}

/// Wall clock in a fixed time zone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }
}

/// Clock frozen at one instant, for deterministic issuance.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Tz>,
}

impl FixedClock {
    /// Freeze the clock at `timestamp` (Unix epoch seconds) in `timezone`.
    ///
    /// Out-of-range timestamps fall back to the epoch.
    pub fn at(timestamp: i64, timezone: Tz) -> Self {
        let instant = Utc
            .timestamp_opt(timestamp, 0)
            .single()
            .unwrap_or_default()
            .with_timezone(&timezone);
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Tz> {
        self.instant
    }
}
