//! Stale quota record purge task
//!
//! Records from earlier UTC days never count toward today's limit, so this
//! task only keeps the store small.

use std::sync::Arc;
use std::time::Duration;

use application::QuotaTracker;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Spawn a task that purges stale quota records every `interval`
///
/// The first purge runs one interval after startup. Abort the returned
/// handle on shutdown.
pub fn spawn_quota_purge_task(quota: Arc<QuotaTracker>, interval: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Starting quota purge task");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            debug!("Running quota purge");

            match quota.purge_stale().await {
                Ok(removed) => debug!(removed, "Quota purge finished"),
                Err(e) => error!(error = %e, "Quota purge failed"),
            }
        }
    })
}
