//! Shift classification.
//!
//! Three fixed eight-hour windows in plant local time (process TZ):
//! S1 07:00–14:59, S2 15:00–22:59, S3 23:00–06:59.

use std::sync::atomic::{AtomicI32, Ordering};

use chrono::{Local, Timelike};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    S1,
    S2,
    S3,
}

impl Shift {
    /// Classify an hour of day (0..=23) into its shift. Total mapping.
    pub fn from_hour(hour: u32) -> Shift {
        if (7..15).contains(&hour) {
            Shift::S1
        } else if (15..23).contains(&hour) {
            Shift::S2
        } else {
            Shift::S3
        }
    }

    /// Shift identifier as published (`turno` 1/2/3).
    pub fn number(self) -> u8 {
        match self {
            Shift::S1 => 1,
            Shift::S2 => 2,
            Shift::S3 => 3,
        }
    }
}

/// Current shift from the process-local wall clock.
pub fn current_shift() -> Shift {
    Shift::from_hour(Local::now().hour())
}

/// Record of the last observed shift, kept by the message handler for a
/// one-shot "shift rolled over" log line. Advisory only: processors
/// detect shift change from their own stored snapshot, so relaxed
/// ordering is enough.
pub struct ShiftTracker {
    last: AtomicI32,
}

impl ShiftTracker {
    pub const fn new() -> Self {
        Self {
            last: AtomicI32::new(-1),
        }
    }

    /// True on the first observation and whenever the shift differs from
    /// the recorded one.
    pub fn observe(&self, current: Shift) -> bool {
        let now = current.number() as i32;
        if self.last.load(Ordering::Relaxed) == now {
            return false;
        }
        self.last.store(now, Ordering::Relaxed);
        true
    }
}

impl Default for ShiftTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_windows() {
        for hour in 0..24 {
            let expected = match hour {
                7..=14 => Shift::S1,
                15..=22 => Shift::S2,
                _ => Shift::S3,
            };
            assert_eq!(Shift::from_hour(hour), expected, "hour {}", hour);
        }
    }

    #[test]
    fn test_shift_numbers() {
        assert_eq!(Shift::S1.number(), 1);
        assert_eq!(Shift::S2.number(), 2);
        assert_eq!(Shift::S3.number(), 3);
    }

    #[test]
    fn test_shift_tracker_is_idempotent() {
        let tracker = ShiftTracker::new();
        // First observation always reports a change.
        assert!(tracker.observe(Shift::S1));
        assert!(!tracker.observe(Shift::S1));
        assert!(tracker.observe(Shift::S2));
        assert!(!tracker.observe(Shift::S2));
    }
}
