//! Time lock gate
//!
//! A uniform delay between the moment a transaction first reaches the
//! confirmation threshold and the moment it may execute. `0` disables it.

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeLock {
    period_secs: u64,
}

impl TimeLock {
    pub fn new(period_secs: u64) -> Self {
        Self { period_secs }
    }

    pub fn period_secs(&self) -> u64 {
        self.period_secs
    }

    pub fn set_period(&mut self, period_secs: u64) {
        self.period_secs = period_secs;
    }

    /// Earliest execution time for a transaction anchored at `threshold_reached_at`
    pub fn unlocks_at(&self, threshold_reached_at: DateTime<Utc>) -> DateTime<Utc> {
        i64::try_from(self.period_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|delay| threshold_reached_at.checked_add_signed(delay))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// `false` when the threshold was never reached
    pub fn is_elapsed(&self, threshold_reached_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match threshold_reached_at {
            Some(anchor) => now >= self.unlocks_at(anchor),
            None => false,
        }
    }
}
