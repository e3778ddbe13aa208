//! Client-side throttle state.
//!
//! The server punishes a client that exceeds its request quota by refusing
//! requests for a fixed window. `BlockState` mirrors that window locally so
//! the client stops sending requests it knows will be refused.
//!
//! Expiry is lazy: nothing is scheduled when a block is set. The next
//! [`BlockState::is_blocked`] call after the deadline clears the flag.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Length of the server's punitive window.
pub const BLOCK_EXTENSION: Duration = Duration::from_secs(60);

/// Whether the client is currently rate-limited, and until when.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockState {
    blocked: bool,
    block_until: Option<DateTime<Utc>>,
}

impl BlockState {
    /// Creates an unblocked state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while `now` is before the deadline.
    ///
    /// Clears the flag once `now` reaches the deadline. Calling this never
    /// moves the deadline.
    pub fn is_blocked(&mut self, now: DateTime<Utc>) -> bool {
        if !self.blocked {
            return false;
        }
        match self.block_until {
            Some(until) if now < until => true,
            _ => {
                self.blocked = false;
                false
            }
        }
    }

    /// Time left until the deadline, zero when not blocked.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        if !self.blocked {
            return Duration::ZERO;
        }
        self.block_until
            .and_then(|until| (until - now).to_std().ok())
            .unwrap_or(Duration::ZERO)
    }

    /// Blocks until `now + extension`.
    ///
    /// The deadline is overwritten, not extended: triggering twice leaves a
    /// single window measured from the second trigger.
    pub fn trigger(&mut self, now: DateTime<Utc>, extension: Duration) {
        let until = TimeDelta::from_std(extension)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.blocked = true;
        self.block_until = Some(until);
    }

    /// Deadline of the last trigger, if any.
    pub fn until(&self) -> Option<DateTime<Utc>> {
        self.block_until
    }

    /// Snapshot for display. Applies lazy expiry first.
    pub fn status(&mut self, now: DateTime<Utc>) -> BlockStatus {
        if self.is_blocked(now) {
            BlockStatus {
                blocked: true,
                until: self.block_until,
                remaining: self.remaining(now),
            }
        } else {
            BlockStatus::default()
        }
    }
}

/// Display view of [`BlockState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStatus {
    pub blocked: bool,
    pub until: Option<DateTime<Utc>>,
    pub remaining: Duration,
}

impl fmt::Display for BlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.blocked, self.until) {
            (true, Some(until)) => write!(
                f,
                "Blocked until {} ({}s remaining)",
                until.format("%H:%M:%S"),
                self.remaining.as_secs_f64().ceil() as u64
            ),
            _ => write!(f, "Not blocked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_new_state_is_not_blocked() {
        let mut state = BlockState::new();
        assert!(!state.is_blocked(at(0)));
        assert_eq!(state.remaining(at(0)), Duration::ZERO);
        assert_eq!(state.until(), None);
    }

    #[test]
    fn test_blocked_before_deadline() {
        let mut state = BlockState::new();
        state.trigger(at(0), BLOCK_EXTENSION);

        for secs in [0, 1, 30, 59] {
            assert!(state.is_blocked(at(secs)), "should be blocked at +{secs}s");
        }
        assert_eq!(state.remaining(at(15)), Duration::from_secs(45));
    }

    #[test]
    fn test_expiry_clears_flag() {
        let mut state = BlockState::new();
        state.trigger(at(0), BLOCK_EXTENSION);

        assert!(!state.is_blocked(at(60)));
        // Stays cleared even if an earlier time is observed afterwards.
        assert!(!state.is_blocked(at(10)));
        assert_eq!(state.remaining(at(10)), Duration::ZERO);
    }

    #[test]
    fn test_retrigger_overwrites_deadline() {
        let mut state = BlockState::new();
        state.trigger(at(0), BLOCK_EXTENSION);
        state.trigger(at(20), BLOCK_EXTENSION);

        assert_eq!(state.until(), Some(at(80)));
        assert!(state.is_blocked(at(79)));
        assert!(!state.is_blocked(at(80)));
    }

    #[test]
    fn test_checking_does_not_extend() {
        let mut state = BlockState::new();
        state.trigger(at(0), BLOCK_EXTENSION);

        for secs in 0..60 {
            state.is_blocked(at(secs));
        }
        assert_eq!(state.until(), Some(at(60)));
    }

    #[test]
    fn test_huge_extension_saturates() {
        let mut state = BlockState::new();
        state.trigger(at(0), Duration::MAX);
        assert_eq!(state.until(), Some(DateTime::<Utc>::MAX_UTC));
        assert!(state.is_blocked(at(1_000_000)));
    }

    #[test]
    fn test_status_display() {
        let mut state = BlockState::new();
        assert_eq!(state.status(at(0)).to_string(), "Not blocked");

        state.trigger(at(0), BLOCK_EXTENSION);
        let status = state.status(at(0));
        assert!(status.blocked);
        assert_eq!(status.remaining, BLOCK_EXTENSION);
        assert!(status.to_string().ends_with("(60s remaining)"));

        let expired = state.status(at(61));
        assert_eq!(expired, BlockStatus::default());
    }
}
