//! Bounded retry for transient platform failures.
//!
//! The executor owns retry policy: a single bounded retry with backoff for
//! rate limits and timeouts, nothing for anything else. The generic shape
//! lets tests drive it with mock errors.

use std::future::Future;
use std::time::Duration;

use crate::effects::PlatformFailure;

/// Configuration for bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Multiplier applied per subsequent retry.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Default policy: one retry after 2 seconds.
    ///
    /// Webhook dispatch happens on the request path, so the total added
    /// latency has to stay small; anything still failing after one retry is
    /// recorded as a per-action failure instead.
    pub const DEFAULT: Self = Self {
        max_retries: 1,
        initial_delay: Duration::from_secs(2),
        backoff_multiplier: 2.0,
    };

    /// Disables retries entirely (used by tests and one-shot tooling).
    pub const NONE: Self = Self {
        max_retries: 0,
        initial_delay: Duration::ZERO,
        backoff_multiplier: 1.0,
    };

    /// Computes the delay for the given retry attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(self.initial_delay.as_secs_f64() * multiplier)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Executes an async operation, retrying retriable failures per `config`.
///
/// Non-retriable failures (not-found, auth, unknown) are returned
/// immediately; retriable ones (rate limit, timeout) are re-attempted after a
/// backoff delay until the retry budget is spent.
pub async fn execute_with_retry<T, E, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, E>
where
    E: PlatformFailure,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.kind().is_retriable() && attempt < config.max_retries => {
                let delay = config.delay_for_attempt(attempt);
                tracing::debug!(
                    kind = ?e.kind(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying transient platform failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
