//! Daily quota records and decisions
//!
//! Quota days are UTC calendar days. A record that belongs to an earlier day
//! counts as zero; it is never carried forward.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Identity;

/// Stories allowed per identity per UTC day unless configured otherwise
pub const DEFAULT_DAILY_LIMIT: u32 = 10;

/// Usage of one identity on one UTC day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub identity: Identity,
    pub day: NaiveDate,
    pub count: u32,
}

impl QuotaRecord {
    /// Fresh record with no usage
    #[must_use]
    pub const fn new(identity: Identity, day: NaiveDate) -> Self {
        Self {
            identity,
            day,
            count: 0,
        }
    }

    /// Usage on `day`; stale records count as zero
    #[must_use]
    pub fn count_on(&self, day: NaiveDate) -> u32 {
        if self.day == day { self.count } else { 0 }
    }

    /// Reset on day change, then increment if below `limit`
    ///
    /// Returns the new count when admitted, `None` when the limit is reached.
    pub fn try_reserve(&mut self, day: NaiveDate, limit: u32) -> Option<u32> {
        if self.day != day {
            self.day = day;
            self.count = 0;
        }
        if self.count >= limit {
            return None;
        }
        self.count += 1;
        Some(self.count)
    }
}

/// Start of the next UTC day after `now`
#[must_use]
pub fn next_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    today
        .checked_add_days(Days::new(1))
        .unwrap_or(today)
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Outcome of an atomic check-and-reserve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum QuotaDecision {
    /// A slot was reserved
    Allowed {
        /// Stories used today, including this one
        used: u32,
        remaining: u32,
        resets_at: DateTime<Utc>,
    },
    /// Daily limit reached
    Denied { resets_at: DateTime<Utc> },
}

impl QuotaDecision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    #[must_use]
    pub const fn resets_at(&self) -> DateTime<Utc> {
        match self {
            Self::Allowed { resets_at, .. } | Self::Denied { resets_at } => *resets_at,
        }
    }
}

/// Read-only view of today's usage for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub used: u32,
    pub remaining: u32,
    pub daily_limit: u32,
    pub resets_at: DateTime<Utc>,
}

impl QuotaStatus {
    #[must_use]
    pub fn new(used: u32, daily_limit: u32, resets_at: DateTime<Utc>) -> Self {
        Self {
            used,
            remaining: daily_limit.saturating_sub(used),
            daily_limit,
            resets_at,
        }
    }

    /// Friendly status line for the story form
    #[must_use]
    pub fn message(&self) -> String {
        match (self.used, self.remaining) {
            (_, 0) => "No stories remaining today. Come back tomorrow!".to_string(),
            (_, 1) => "1 story remaining today".to_string(),
            (0, _) => format!(
                "Welcome! You can create up to {} stories today.",
                self.daily_limit
            ),
            (_, n) => format!("{n} stories remaining today"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn identity() -> Identity {
        Identity::new("u1").unwrap()
    }

    #[test]
    fn reserve_until_limit() {
        let mut record = QuotaRecord::new(identity(), day(1));
        for expected in 1..=3 {
            assert_eq!(record.try_reserve(day(1), 3), Some(expected));
        }
        assert_eq!(record.try_reserve(day(1), 3), None);
        assert_eq!(record.count, 3);
    }

    #[test]
    fn new_day_resets_count() {
        let mut record = QuotaRecord {
            identity: identity(),
            day: day(1),
            count: 10,
        };
        assert_eq!(record.count_on(day(2)), 0);
        assert_eq!(record.try_reserve(day(2), 10), Some(1));
        assert_eq!(record.day, day(2));
    }

    #[test]
    fn zero_limit_never_admits() {
        let mut record = QuotaRecord::new(identity(), day(1));
        assert_eq!(record.try_reserve(day(1), 0), None);
    }

    #[test]
    fn next_reset_is_following_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 59).unwrap();
        assert_eq!(
            next_reset(now),
            Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap()
        );

        let midnight = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(
            next_reset(midnight),
            Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn next_reset_crosses_month_end() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap();
        assert_eq!(
            next_reset(now),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn status_messages() {
        let reset = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
        assert_eq!(
            QuotaStatus::new(0, 10, reset).message(),
            "Welcome! You can create up to 10 stories today."
        );
        assert_eq!(
            QuotaStatus::new(4, 10, reset).message(),
            "6 stories remaining today"
        );
        assert_eq!(
            QuotaStatus::new(9, 10, reset).message(),
            "1 story remaining today"
        );
        assert_eq!(
            QuotaStatus::new(10, 10, reset).message(),
            "No stories remaining today. Come back tomorrow!"
        );
    }

    #[test]
    fn decision_exposes_reset_time() {
        let reset = Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap();
        let denied = QuotaDecision::Denied { resets_at: reset };
        assert!(!denied.is_allowed());
        assert_eq!(denied.resets_at(), reset);
    }
}
