//! Event Timestamps
//!
//! Input events carry the kernel's `timeval`. Gesture timing only ever looks
//! at the difference between two of them, so they are flattened to a single
//! microsecond counter.

use std::time::{SystemTime, UNIX_EPOCH};

/// Microsecond timestamp of an input event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch; also the value of "never happened"
    pub const ZERO: Timestamp = Timestamp(0);

    /// Build from a raw microsecond count
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Build from a kernel `timeval` pair; negative fields clamp to zero
    pub fn from_timeval(sec: i64, usec: i64) -> Self {
        let sec = sec.max(0) as u64;
        let usec = usec.max(0) as u64;
        Self(sec.saturating_mul(1_000_000).saturating_add(usec))
    }

    /// Build from the `SystemTime` evdev reports for an event
    pub fn from_system_time(time: SystemTime) -> Self {
        time.duration_since(UNIX_EPOCH)
            .map(|d| Self(d.as_micros() as u64))
            .unwrap_or_default()
    }

    /// Raw microsecond count
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Microseconds elapsed since `earlier`, or `None` if `earlier` is later
    pub fn micros_since(self, earlier: Timestamp) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }

    /// True when `earlier` happened less than `window_us` before `self`
    pub fn within(self, earlier: Timestamp, window_us: u64) -> bool {
        matches!(self.micros_since(earlier), Some(elapsed) if elapsed < window_us)
    }
}
