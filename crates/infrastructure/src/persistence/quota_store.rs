//! SQLite-backed quota store
//!
//! One row per identity holding the current day and its count. Reservation
//! is a single conditional UPSERT inside an immediate transaction, so two
//! connections can never both take the last slot.

use std::sync::Arc;

use application::{
    error::ApplicationError,
    ports::{QuotaStorePort, Reservation},
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use domain::Identity;
use rusqlite::{OptionalExtension, TransactionBehavior, params};
use tokio::task;
use tracing::{debug, instrument};

use super::connection::ConnectionPool;

const RESERVE_SQL: &str = "
    INSERT INTO quota_usage (identity, day, count, updated_at)
    VALUES (?1, ?2, 1, ?3)
    ON CONFLICT(identity) DO UPDATE SET
        count = CASE WHEN quota_usage.day = excluded.day THEN quota_usage.count + 1 ELSE 1 END,
        day = excluded.day,
        updated_at = excluded.updated_at
    WHERE quota_usage.day <> excluded.day OR quota_usage.count < ?4
    RETURNING count";

const USAGE_SQL: &str = "SELECT count FROM quota_usage WHERE identity = ?1 AND day = ?2";

/// SQLite implementation of [`QuotaStorePort`]
#[derive(Debug, Clone)]
pub struct SqliteQuotaStore {
    pool: Arc<ConnectionPool>,
}

impl SqliteQuotaStore {
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

fn storage_error(e: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::Storage(e.to_string())
}

fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

fn to_count(raw: i64) -> Result<u32, ApplicationError> {
    u32::try_from(raw).map_err(|_| storage_error(format!("stored count out of range: {raw}")))
}

#[async_trait]
impl QuotaStorePort for SqliteQuotaStore {
    #[instrument(skip(self), fields(identity = %identity))]
    async fn reserve(
        &self,
        identity: &Identity,
        day: NaiveDate,
        limit: u32,
    ) -> Result<Reservation, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let key = identity.as_str().to_string();

        task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(storage_error)?;
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(storage_error)?;

            let day = day_key(day);
            let admitted: Option<i64> = tx
                .query_row(
                    RESERVE_SQL,
                    params![key, day, Utc::now().to_rfc3339(), i64::from(limit)],
                    |row| row.get(0),
                )
                .optional()
                .map_err(storage_error)?;

            let reservation = match admitted {
                Some(count) => Reservation {
                    admitted: true,
                    count: to_count(count)?,
                },
                None => {
                    let count: i64 = tx
                        .query_row(USAGE_SQL, params![key, day], |row| row.get(0))
                        .optional()
                        .map_err(storage_error)?
                        .unwrap_or(0);
                    Reservation {
                        admitted: false,
                        count: to_count(count)?,
                    }
                },
            };

            tx.commit().map_err(storage_error)?;
            debug!(admitted = reservation.admitted, count = reservation.count, "Quota reservation");
            Ok(reservation)
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self), fields(identity = %identity))]
    async fn usage(&self, identity: &Identity, day: NaiveDate) -> Result<u32, ApplicationError> {
        let pool = Arc::clone(&self.pool);
        let key = identity.as_str().to_string();

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(storage_error)?;
            let count: i64 = conn
                .query_row(USAGE_SQL, params![key, day_key(day)], |row| row.get(0))
                .optional()
                .map_err(storage_error)?
                .unwrap_or(0);
            to_count(count)
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }

    #[instrument(skip(self))]
    async fn purge_before(&self, day: NaiveDate) -> Result<u64, ApplicationError> {
        let pool = Arc::clone(&self.pool);

        task::spawn_blocking(move || {
            let conn = pool.get().map_err(storage_error)?;
            let removed = conn
                .execute("DELETE FROM quota_usage WHERE day < ?1", [day_key(day)])
                .map_err(storage_error)?;
            Ok(removed as u64)
        })
        .await
        .map_err(|e| ApplicationError::Internal(e.to_string()))?
    }
}
