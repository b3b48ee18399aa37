//! Spending limit tracker
//!
//! Daily and weekly accumulators with lazy window reset. A reset happens at
//! the moment of the next debit check, never on a timer: when one or more
//! whole periods have elapsed since the window start, the accumulator drops
//! to zero and the start moves forward by exactly those whole periods.

use chrono::{DateTime, Duration, Utc};
use custody_core::{Amount, TxId};
use strum_macros::{Display, EnumString};

use crate::error::{WalletError, WalletResult};

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
pub const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;

/// Spending window kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LimitWindow {
    Daily,
    Weekly,
}

impl LimitWindow {
    pub fn period_secs(&self) -> i64 {
        match self {
            LimitWindow::Daily => SECONDS_PER_DAY,
            LimitWindow::Weekly => SECONDS_PER_WEEK,
        }
    }
}

/// One rolling window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendWindow {
    kind: LimitWindow,
    limit: Amount,
    spent: Amount,
    started_at: DateTime<Utc>,
}

impl SpendWindow {
    fn new(kind: LimitWindow, limit: Amount, started_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            limit,
            spent: Amount::ZERO,
            started_at,
        }
    }

    /// Accumulator and window start as they would be after a reset at `now`
    fn rolled(&self, now: DateTime<Utc>) -> (Amount, DateTime<Utc>) {
        let period = self.kind.period_secs();
        let elapsed = (now - self.started_at).num_seconds();
        if elapsed < period {
            return (self.spent, self.started_at);
        }

        let periods = elapsed / period;
        (
            Amount::ZERO,
            self.started_at + Duration::seconds(periods * period),
        )
    }

    fn check(&self, id: TxId, value: Amount, now: DateTime<Utc>) -> WalletResult<()> {
        // Uncapped windows still refuse an accumulator overflow
        let (spent, _) = self.rolled(now);
        match spent.checked_add(&value) {
            Some(_) if self.limit.is_zero() => Ok(()),
            Some(total) if total <= self.limit => Ok(()),
            _ => Err(WalletError::LimitExceeded {
                id,
                window: self.kind,
                limit: self.limit,
                spent,
                value,
            }),
        }
    }

    fn debit(&mut self, value: Amount, now: DateTime<Utc>) {
        let (spent, started_at) = self.rolled(now);
        self.spent = spent.saturating_add(&value);
        self.started_at = started_at;
    }

    pub fn limit(&self) -> Amount {
        self.limit
    }

    /// Accumulator as last recorded (no reset applied)
    pub fn recorded_spent(&self) -> Amount {
        self.spent
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Daily and weekly caps for the custody account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendingLimits {
    daily: SpendWindow,
    weekly: SpendWindow,
}

impl SpendingLimits {
    /// Both windows start at `start` (wallet creation time)
    pub fn new(daily_limit: Amount, weekly_limit: Amount, start: DateTime<Utc>) -> Self {
        Self {
            daily: SpendWindow::new(LimitWindow::Daily, daily_limit, start),
            weekly: SpendWindow::new(LimitWindow::Weekly, weekly_limit, start),
        }
    }

    pub fn window(&self, kind: LimitWindow) -> &SpendWindow {
        match kind {
            LimitWindow::Daily => &self.daily,
            LimitWindow::Weekly => &self.weekly,
        }
    }

    fn window_mut(&mut self, kind: LimitWindow) -> &mut SpendWindow {
        match kind {
            LimitWindow::Daily => &mut self.daily,
            LimitWindow::Weekly => &mut self.weekly,
        }
    }

    pub fn limit(&self, kind: LimitWindow) -> Amount {
        self.window(kind).limit
    }

    /// Effective spent amount at `now` (after a lazy reset, if due)
    pub fn spent(&self, kind: LimitWindow, now: DateTime<Utc>) -> Amount {
        self.window(kind).rolled(now).0
    }

    /// Remaining capacity at `now`; `None` when the window is uncapped
    pub fn remaining(&self, kind: LimitWindow, now: DateTime<Utc>) -> Option<Amount> {
        let window = self.window(kind);
        if window.limit.is_zero() {
            return None;
        }
        Some(window.limit.saturating_sub(&window.rolled(now).0))
    }

    /// Validate a debit against both caps without mutating anything
    pub fn check_debit(&self, id: TxId, value: Amount, now: DateTime<Utc>) -> WalletResult<()> {
        self.daily.check(id, value, now)?;
        self.weekly.check(id, value, now)
    }

    /// Apply a validated debit: reset due windows, then add
    pub fn debit(&mut self, value: Amount, now: DateTime<Utc>) {
        self.daily.debit(value, now);
        self.weekly.debit(value, now);
    }

    pub fn set_limit(&mut self, kind: LimitWindow, limit: Amount) {
        self.window_mut(kind).limit = limit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_second_debit_exceeds_daily_cap() {
        let mut limits = SpendingLimits::new(Amount::new(10), Amount::ZERO, start());
        let now = start() + Duration::hours(1);

        limits.check_debit(0, Amount::new(6), now).unwrap();
        limits.debit(Amount::new(6), now);
        assert_eq!(limits.spent(LimitWindow::Daily, now), Amount::new(6));

        let result = limits.check_debit(1, Amount::new(6), now);
        assert!(matches!(
            result,
            Err(WalletError::LimitExceeded {
                id: 1,
                window: LimitWindow::Daily,
                ..
            })
        ));
        assert_eq!(limits.spent(LimitWindow::Daily, now), Amount::new(6));
    }

    #[test]
    fn test_exact_cap_allowed() {
        let limits = SpendingLimits::new(Amount::new(10), Amount::ZERO, start());
        assert!(limits.check_debit(0, Amount::new(10), start()).is_ok());
        assert!(limits.check_debit(0, Amount::new(11), start()).is_err());
    }

    #[test]
    fn test_zero_limit_is_uncapped_but_tracked() {
        let mut limits = SpendingLimits::new(Amount::ZERO, Amount::ZERO, start());
        limits.check_debit(0, Amount::new(u128::MAX), start()).unwrap();
        limits.debit(Amount::new(500), start());

        assert_eq!(limits.spent(LimitWindow::Daily, start()), Amount::new(500));
        assert_eq!(limits.remaining(LimitWindow::Daily, start()), None);
    }

    #[test]
    fn test_uncapped_window_rejects_accumulator_overflow() {
        let mut limits = SpendingLimits::new(Amount::ZERO, Amount::ZERO, start());
        limits.debit(Amount::new(u128::MAX), start());

        let result = limits.check_debit(4, Amount::new(1), start());
        assert!(matches!(
            result,
            Err(WalletError::LimitExceeded {
                id: 4,
                window: LimitWindow::Daily,
                ..
            })
        ));

        // A new period starts from zero again
        let next_day = start() + Duration::days(1);
        assert!(limits.check_debit(4, Amount::new(1), next_day).is_err());
        let next_week = start() + Duration::days(7);
        limits.check_debit(4, Amount::new(1), next_week).unwrap();
    }

    #[test]
    fn test_daily_window_resets_after_a_day() {
        let mut limits = SpendingLimits::new(Amount::new(10), Amount::ZERO, start());
        limits.debit(Amount::new(8), start());

        let next_day = start() + Duration::days(1);
        assert_eq!(limits.spent(LimitWindow::Daily, next_day), Amount::ZERO);
        limits.check_debit(0, Amount::new(8), next_day).unwrap();
    }

    #[test]
    fn test_window_advances_by_whole_missed_periods() {
        let mut limits = SpendingLimits::new(Amount::new(10), Amount::new(100), start());
        limits.debit(Amount::new(5), start());

        // Three and a half days later
        let later = start() + Duration::hours(84);
        limits.debit(Amount::new(2), later);

        let daily = limits.window(LimitWindow::Daily);
        assert_eq!(daily.started_at(), start() + Duration::days(3));
        assert_eq!(daily.recorded_spent(), Amount::new(2));

        // Weekly window has not rolled over
        let weekly = limits.window(LimitWindow::Weekly);
        assert_eq!(weekly.started_at(), start());
        assert_eq!(weekly.recorded_spent(), Amount::new(7));
    }

    #[test]
    fn test_weekly_cap_applies_across_days() {
        let mut limits = SpendingLimits::new(Amount::ZERO, Amount::new(15), start());
        limits.debit(Amount::new(10), start());

        let tomorrow = start() + Duration::days(1);
        let result = limits.check_debit(3, Amount::new(6), tomorrow);
        assert!(matches!(
            result,
            Err(WalletError::LimitExceeded {
                window: LimitWindow::Weekly,
                ..
            })
        ));
        assert_eq!(limits.remaining(LimitWindow::Weekly, tomorrow), Some(Amount::new(5)));
    }

    #[test]
    fn test_window_kind_parses() {
        assert_eq!("daily".parse::<LimitWindow>().unwrap(), LimitWindow::Daily);
        assert_eq!(LimitWindow::Weekly.to_string(), "weekly");
    }
}
