//! Quota tracker - Enforces the daily story limit per identity
//!
//! The tracker owns the notion of "today" (UTC, from the injected clock) and
//! delegates the atomic check-and-increment to the quota store. Reserved
//! slots are never handed back, even if the story later fails.

use std::{fmt, sync::Arc};

use domain::{Identity, QuotaDecision, QuotaStatus, next_reset};
use tracing::{debug, info, instrument};

use crate::{
    error::ApplicationError,
    ports::{Clock, QuotaStorePort},
};

/// Service guarding the per-identity daily limit
pub struct QuotaTracker {
    store: Arc<dyn QuotaStorePort>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for QuotaTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuotaTracker")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl QuotaTracker {
    pub fn new(store: Arc<dyn QuotaStorePort>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Reserve one story for `identity` if today's count is below `daily_limit`
    #[instrument(skip(self), fields(identity = %identity))]
    pub async fn check_and_reserve(
        &self,
        identity: &Identity,
        daily_limit: u32,
    ) -> Result<QuotaDecision, ApplicationError> {
        let now = self.clock.now();
        let resets_at = next_reset(now);

        if daily_limit == 0 {
            debug!("Daily limit is zero, denying without touching the store");
            return Ok(QuotaDecision::Denied { resets_at });
        }

        let reservation = self
            .store
            .reserve(identity, now.date_naive(), daily_limit)
            .await?;

        if reservation.admitted {
            debug!(used = reservation.count, daily_limit, "Quota slot reserved");
            Ok(QuotaDecision::Allowed {
                used: reservation.count,
                remaining: daily_limit.saturating_sub(reservation.count),
                resets_at,
            })
        } else {
            info!(used = reservation.count, daily_limit, %resets_at, "Daily quota exhausted");
            Ok(QuotaDecision::Denied { resets_at })
        }
    }

    /// Today's usage for display; does not reserve anything
    pub async fn status(
        &self,
        identity: &Identity,
        daily_limit: u32,
    ) -> Result<QuotaStatus, ApplicationError> {
        let now = self.clock.now();
        let used = self.store.usage(identity, now.date_naive()).await?;
        Ok(QuotaStatus::new(used.min(daily_limit), daily_limit, next_reset(now)))
    }

    /// Remove records from previous days
    #[instrument(skip(self))]
    pub async fn purge_stale(&self) -> Result<u64, ApplicationError> {
        let today = self.clock.now().date_naive();
        let removed = self.store.purge_before(today).await?;
        if removed > 0 {
            info!(removed, "Purged stale quota records");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use mockall::predicate::eq;

    use super::*;
    use crate::ports::{ManualClock, MockQuotaStorePort, Reservation};
    use crate::services::test_support::InMemoryStore;

    fn tracker_with_store(store: Arc<dyn QuotaStorePort>, clock: &ManualClock) -> QuotaTracker {
        QuotaTracker::new(store, Arc::new(clock.clone()))
    }

    fn u1() -> Identity {
        Identity::new("u1").unwrap()
    }

    #[tokio::test]
    async fn eleventh_request_is_denied_until_midnight() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 15, 30, 0).unwrap());
        let tracker = tracker_with_store(Arc::new(InMemoryStore::default()), &clock);

        for n in 1..=10 {
            let decision = tracker.check_and_reserve(&u1(), 10).await.unwrap();
            assert_eq!(
                decision,
                QuotaDecision::Allowed {
                    used: n,
                    remaining: 10 - n,
                    resets_at: Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
                }
            );
        }

        let decision = tracker.check_and_reserve(&u1(), 10).await.unwrap();
        assert_eq!(
            decision,
            QuotaDecision::Denied {
                resets_at: Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap()
            }
        );
    }

    #[tokio::test]
    async fn rollover_resets_count() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 0).unwrap());
        let tracker = tracker_with_store(Arc::new(InMemoryStore::default()), &clock);

        for _ in 0..10 {
            tracker.check_and_reserve(&u1(), 10).await.unwrap();
        }
        assert!(!tracker.check_and_reserve(&u1(), 10).await.unwrap().is_allowed());

        clock.advance(Duration::minutes(2));
        let decision = tracker.check_and_reserve(&u1(), 10).await.unwrap();
        assert!(matches!(decision, QuotaDecision::Allowed { used: 1, .. }));

        let status = tracker.status(&u1(), 10).await.unwrap();
        assert_eq!(status.used, 1);
        assert_eq!(status.remaining, 9);
    }

    #[tokio::test]
    async fn identities_are_independent() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap());
        let tracker = tracker_with_store(Arc::new(InMemoryStore::default()), &clock);
        let other = Identity::new("u2").unwrap();

        for _ in 0..3 {
            tracker.check_and_reserve(&u1(), 3).await.unwrap();
        }
        assert!(!tracker.check_and_reserve(&u1(), 3).await.unwrap().is_allowed());
        assert!(tracker.check_and_reserve(&other, 3).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn concurrent_requests_never_over_admit() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap());
        let tracker = Arc::new(tracker_with_store(
            Arc::new(InMemoryStore::default()),
            &clock,
        ));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                tokio::spawn(async move { tracker.check_and_reserve(&u1(), 10).await })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_allowed() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
    }

    #[tokio::test]
    async fn zero_limit_skips_store() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap());
        let mut store = MockQuotaStorePort::new();
        store.expect_reserve().never();
        let tracker = tracker_with_store(Arc::new(store), &clock);

        let decision = tracker.check_and_reserve(&u1(), 0).await.unwrap();
        assert!(!decision.is_allowed());
    }

    #[tokio::test]
    async fn store_errors_propagate() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap());
        let mut store = MockQuotaStorePort::new();
        store
            .expect_reserve()
            .returning(|_, _, _| Err(ApplicationError::Storage("locked".to_string())));
        let tracker = tracker_with_store(Arc::new(store), &clock);

        let err = tracker.check_and_reserve(&u1(), 10).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Storage(_)));
    }

    #[tokio::test]
    async fn reserve_uses_utc_day_from_clock() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 23, 30, 0).unwrap());
        let mut store = MockQuotaStorePort::new();
        store
            .expect_reserve()
            .with(
                eq(u1()),
                eq(chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
                eq(10),
            )
            .times(1)
            .returning(|_, _, _| {
                Ok(Reservation {
                    admitted: true,
                    count: 4,
                })
            });
        let tracker = tracker_with_store(Arc::new(store), &clock);

        let decision = tracker.check_and_reserve(&u1(), 10).await.unwrap();
        assert!(matches!(
            decision,
            QuotaDecision::Allowed {
                used: 4,
                remaining: 6,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn purge_uses_today() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 3, 1, 0, 0).unwrap());
        let mut store = MockQuotaStorePort::new();
        store
            .expect_purge_before()
            .with(eq(chrono::NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()))
            .returning(|_| Ok(2));
        let tracker = tracker_with_store(Arc::new(store), &clock);

        assert_eq!(tracker.purge_stale().await.unwrap(), 2);
    }
}
