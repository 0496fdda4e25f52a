//! # Clock Abstraction
//!
//! Every time-dependent decision in the pipeline (credential expiry,
//! not-before, cache TTL, refresh debounce) reads the time through a
//! [`Clock`]. Production code uses [`SystemClock`]; tests use
//! [`FixedClock`] and move it explicitly.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};
use parking_lot::Mutex;

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// The current instant as milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }

    /// UTC offset used when rendering an instant as a calendar date.
    ///
    /// Defaults to the device's local zone, matching how a scanner shows
    /// expiry dates to the person holding the phone.
    fn display_offset(&self, at: DateTime<Utc>) -> FixedOffset {
        Local.offset_from_utc_datetime(&at.naive_utc()).fix()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn display_offset(&self, at: DateTime<Utc>) -> FixedOffset {
        (**self).display_offset(at)
    }
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A manually driven clock that renders dates in UTC.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Build a clock from milliseconds since the epoch. Out-of-range values
    /// clamp to the epoch.
    pub fn from_millis(ms: i64) -> Self {
        Self::new(DateTime::from_timestamp_millis(ms).unwrap_or_default())
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    fn display_offset(&self, _at: DateTime<Utc>) -> FixedOffset {
        Utc.fix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::from_millis(1_000);
        clock.advance(Duration::milliseconds(500));
        assert_eq!(clock.now_ms(), 1_500);
    }

    #[test]
    fn fixed_clock_renders_in_utc() {
        let clock = FixedClock::from_millis(0);
        assert_eq!(clock.display_offset(clock.now()).local_minus_utc(), 0);
    }

    #[test]
    fn arc_clock_delegates() {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::from_millis(42));
        assert_eq!(clock.now_ms(), 42);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now().timestamp() > 1_577_836_800);
    }
}
