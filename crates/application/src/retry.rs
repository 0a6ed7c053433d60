//! Retry policy shared by the story composer and the speech synthesizer
//!
//! A [`RetryPolicy`] bundles the attempt limit, the backoff schedule and the
//! retryable predicate ([`Retryable`]) so both provider clients retry the
//! same way.
//!
//! # Example
//!
//! ```rust,ignore
//! use application::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::generation();
//! let outcome = policy.run(|| async { provider.generate(request.clone()).await }).await;
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Errors that know whether trying again can help
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// How many times to retry and how long to wait in between
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = single attempt)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for any single delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Backoff multiplier; 1.0 gives a fixed delay
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Random spread applied to each delay (0.0 disables jitter)
    #[serde(default)]
    pub jitter_factor: f64,
}

const fn default_max_retries() -> u32 {
    1
}

const fn default_initial_delay() -> u64 {
    500
}

const fn default_max_delay() -> u64 {
    5_000
}

const fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::generation()
    }
}

impl RetryPolicy {
    /// Text generation: one retry after a short fixed pause
    #[must_use]
    pub const fn generation() -> Self {
        Self {
            max_retries: 1,
            initial_delay_ms: 500,
            max_delay_ms: 500,
            multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }

    /// Chunk synthesis: two retries with exponential backoff and jitter
    #[must_use]
    pub const fn synthesis() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 250,
            max_delay_ms: 2_000,
            multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }

    /// Single attempt, no retries
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }

    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = delay.as_millis() as u64;
        if self.max_delay_ms < self.initial_delay_ms {
            self.max_delay_ms = self.initial_delay_ms;
        }
        self
    }

    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter_factor = 0.0;
        self
    }

    /// Total attempts this policy allows
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (0-indexed)
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = retry.min(32) as i32;
        let base = (self.initial_delay_ms as f64) * self.multiplier.powi(exponent);
        let capped = base.min(self.max_delay_ms as f64);

        let delay = if self.jitter_factor > 0.0 {
            let spread = capped * self.jitter_factor;
            (capped + rand::rng().random_range(-spread..=spread)).max(0.0)
        } else {
            capped
        };

        Duration::from_millis(delay as u64)
    }

    /// Run `operation` until it succeeds, fails permanently or attempts run out
    #[allow(clippy::cast_possible_truncation)]
    pub async fn run<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let err = match operation().await {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(attempts, "Operation succeeded after retry");
                    }
                    return RetryOutcome {
                        result: Ok(value),
                        attempts,
                        elapsed: start.elapsed(),
                    };
                },
                Err(err) => err,
            };

            if !err.is_retryable() {
                debug!(attempts, error = %err, "Operation failed with non-retryable error");
                return RetryOutcome {
                    result: Err(err),
                    attempts,
                    elapsed: start.elapsed(),
                };
            }

            if attempts > self.max_retries {
                warn!(
                    attempts,
                    max_retries = self.max_retries,
                    error = %err,
                    "Operation failed after max retries"
                );
                return RetryOutcome {
                    result: Err(err),
                    attempts,
                    elapsed: start.elapsed(),
                };
            }

            let delay = self.delay_for_retry(attempts - 1);
            warn!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Operation failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Final result of a retried operation plus bookkeeping
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    /// Attempts made (1 = no retries)
    pub attempts: u32,
    /// Wall time including backoff
    pub elapsed: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}
