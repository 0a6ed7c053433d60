//! In-process quota store
//!
//! Counts live only as long as the process. Suitable for a single instance
//! and for tests.

use std::collections::HashMap;

use application::{
    error::ApplicationError,
    ports::{QuotaStorePort, Reservation},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{Identity, QuotaRecord};
use parking_lot::Mutex;
use tracing::debug;

/// Mutex-guarded map of quota records
#[derive(Debug, Default)]
pub struct InMemoryQuotaStore {
    records: Mutex<HashMap<Identity, QuotaRecord>>,
}

impl InMemoryQuotaStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, stale ones included
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl QuotaStorePort for InMemoryQuotaStore {
    async fn reserve(
        &self,
        identity: &Identity,
        day: NaiveDate,
        limit: u32,
    ) -> Result<Reservation, ApplicationError> {
        let mut records = self.records.lock();
        let record = records
            .entry(identity.clone())
            .or_insert_with(|| QuotaRecord::new(identity.clone(), day));

        let admitted = record.try_reserve(day, limit).is_some();
        let count = record.count_on(day);
        debug!(identity = %identity, admitted, count, "Quota reservation");

        Ok(Reservation { admitted, count })
    }

    async fn usage(&self, identity: &Identity, day: NaiveDate) -> Result<u32, ApplicationError> {
        Ok(self
            .records
            .lock()
            .get(identity)
            .map_or(0, |record| record.count_on(day)))
    }

    async fn purge_before(&self, day: NaiveDate) -> Result<u64, ApplicationError> {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, record| record.day >= day);
        Ok((before - records.len()) as u64)
    }
}
