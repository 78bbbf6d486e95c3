//! Time source for tracker operations
//!
//! Entries carry a Unix timestamp in seconds plus the local timezone offset
//! in minutes (negative west of UTC). Both come from a [`Clock`] so tests can
//! pin them.

use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};

/// Source of the current time and timezone offset
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch, with sub-second precision
    fn now_sec(&self) -> f64;

    /// Local timezone offset in minutes
    fn offset_min(&self) -> i32;
}

/// Wall clock with the host's timezone offset
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_sec(&self) -> f64 {
        chrono::Utc::now().timestamp_millis() as f64 / 1000.0
    }

    fn offset_min(&self) -> i32 {
        chrono::Local::now().offset().local_minus_utc() / 60
    }
}

/// Manually driven clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    now_bits: AtomicU64,
    offset_min: AtomicI32,
}

impl FixedClock {
    /// Clock frozen at `now_sec` with the given offset
    pub fn new(now_sec: f64, offset_min: i32) -> Self {
        Self {
            now_bits: AtomicU64::new(now_sec.to_bits()),
            offset_min: AtomicI32::new(offset_min),
        }
    }

    /// Move the clock to `now_sec`
    pub fn set(&self, now_sec: f64) {
        self.now_bits.store(now_sec.to_bits(), Ordering::SeqCst);
    }

    /// Move the clock forward by `secs`
    pub fn advance(&self, secs: f64) {
        self.set(self.now_sec() + secs);
    }

    /// Change the reported offset
    pub fn set_offset(&self, offset_min: i32) {
        self.offset_min.store(offset_min, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_sec(&self) -> f64 {
        f64::from_bits(self.now_bits.load(Ordering::SeqCst))
    }

    fn offset_min(&self) -> i32 {
        self.offset_min.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_advance() {
        let clock = FixedClock::new(1_700_000_000.5, -300);
        clock.advance(60.0);
        assert_eq!(clock.now_sec(), 1_700_000_060.5);
        assert_eq!(clock.offset_min(), -300);
    }

    #[test]
    fn test_system_clock_offset_in_range() {
        let offset = SystemClock.offset_min();
        assert!((-14 * 60..=14 * 60).contains(&offset));
        assert!(SystemClock.now_sec() > 1_600_000_000.0);
    }
}
