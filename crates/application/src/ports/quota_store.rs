//! Quota store port - Keyed daily usage counters

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::Identity;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Result of an atomic check-and-increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// Whether a slot was taken
    pub admitted: bool,
    /// Usage for the day after the operation
    pub count: u32,
}

/// Storage for per-identity daily quota records
///
/// `reserve` must be atomic per identity: concurrent callers may never
/// observe the same count and both be admitted. A stored record for a day
/// other than `day` counts as zero and is overwritten.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuotaStorePort: Send + Sync {
    /// Increment the identity's count for `day` if it is below `limit`
    async fn reserve(
        &self,
        identity: &Identity,
        day: NaiveDate,
        limit: u32,
    ) -> Result<Reservation, ApplicationError>;

    /// Current count for `day` without changing it
    async fn usage(&self, identity: &Identity, day: NaiveDate) -> Result<u32, ApplicationError>;

    /// Drop records for days before `day`; returns how many were removed
    async fn purge_before(&self, day: NaiveDate) -> Result<u64, ApplicationError>;
}
