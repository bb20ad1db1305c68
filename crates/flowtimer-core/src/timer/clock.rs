//! Wall-clock sources for the timer engine.
//!
//! The engine never counts ticks; every displayed value is derived from an
//! anchor timestamp and `Clock::now_ms()`. Injecting the clock keeps the
//! engine deterministic under test.

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Format of the calendar-day grouping key stored on sessions.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// Calendar day (`YYYY-MM-DD`) of `epoch_ms` in the user's timezone.
    fn date_key(&self, epoch_ms: i64) -> String;
}

/// The system clock in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn date_key(&self, epoch_ms: i64) -> String {
        Local
            .timestamp_millis_opt(epoch_ms)
            .single()
            .unwrap_or_else(Local::now)
            .format(DATE_KEY_FORMAT)
            .to_string()
    }
}

/// A manually driven clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
    offset: FixedOffset,
}

impl ManualClock {
    /// Clock fixed at `epoch_ms`, reporting date keys in UTC.
    pub fn at(epoch_ms: i64) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(epoch_ms)),
            offset: Utc.fix(),
        }
    }

    /// Report date keys in a fixed UTC offset instead of UTC.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn set_ms(&self, epoch_ms: i64) {
        self.now_ms.store(epoch_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_ms(secs.saturating_mul(1000));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn date_key(&self, epoch_ms: i64) -> String {
        self.offset
            .timestamp_millis_opt(epoch_ms)
            .single()
            .map(|dt| dt.format(DATE_KEY_FORMAT).to_string())
            .unwrap_or_default()
    }
}

/// Convert an epoch-millisecond timestamp for event payloads.
pub fn to_utc(epoch_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(epoch_ms).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2025-07-01T12:00:00Z
    const NOON: i64 = 1_751_371_200_000;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::at(NOON);
        let other = clock.clone();
        clock.advance_secs(90);
        assert_eq!(other.now_ms(), NOON + 90_000);
    }

    #[test]
    fn date_key_respects_offset() {
        let utc = ManualClock::at(NOON);
        assert_eq!(utc.date_key(NOON), "2025-07-01");

        let tokyo = ManualClock::at(NOON).with_offset(FixedOffset::east_opt(13 * 3600).unwrap());
        assert_eq!(tokyo.date_key(NOON), "2025-07-02");
    }

    #[test]
    fn to_utc_round_trips_millis() {
        assert_eq!(to_utc(NOON).timestamp_millis(), NOON);
    }
}
