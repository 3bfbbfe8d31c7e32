//! Retry with exponential backoff and jitter.
//!
//! Used by the download executor only; listing and matching never retry.

use crate::config::NetworkConfig;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry behaviour.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Multiply each delay by a random factor in `0.5..1.5`.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: NetworkConfig::DOWNLOAD_RETRY_ATTEMPTS,
            base_delay: NetworkConfig::DOWNLOAD_RETRY_BASE_DELAY,
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `attempt` (0-indexed): `base * 2^attempt`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let max = self.max_delay.as_secs_f64();
        let mut secs = (self.base_delay.as_secs_f64() * 2f64.powi(exponent)).min(max);
        if self.jitter {
            secs = (secs * rand::rng().random_range(0.5..1.5)).min(max);
        }
        Duration::from_secs_f64(secs)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// runs out of attempts. Returns the last result and the number of attempts.
pub async fn retry_async<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
    should_retry: impl Fn(&E) -> bool,
) -> (Result<T, E>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("Succeeded after {} attempts", attempt);
                }
                return (Ok(value), attempt);
            }
            Err(e) if attempt < config.max_attempts && should_retry(&e) => {
                let delay = config.delay_for(attempt - 1);
                warn!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt, config.max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return (Err(e), attempt),
        }
    }
}
