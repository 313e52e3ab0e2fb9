use rand::Rng;
use std::future::Future;
use std::time::Duration;

use crate::error::{BatasError, Result};

/// Upper bound on any single inter-attempt delay, computed or upstream-hinted.
const MAX_DELAY: Duration = Duration::from_secs(10);
/// Fraction of the computed delay added as randomized jitter to avoid
/// thundering-herd retries against the upstream.
const JITTER_FACTOR: f64 = 0.2;

/// Bounded retry for calls against the upstream knowledge base.
///
/// Only transient failures are retried: rate limiting (honoring the
/// `Retry-After` hint when present) and connection-level errors, both with
/// exponential backoff. Any other error aborts immediately — a malformed or
/// semantically failed response will not get better by asking again.
#[derive(Debug, Clone)]
pub struct RetryClient {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryClient {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error: Option<BatasError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = match &last_error {
                    Some(BatasError::KbRateLimit {
                        retry_after: Some(secs),
                    }) => Duration::from_secs(*secs).min(MAX_DELAY),
                    _ => self.backoff_delay(attempt),
                };
                tokio::time::sleep(delay).await;
            }

            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "Transient knowledge base failure"
                    );
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        Err(last_error
            .unwrap_or_else(|| BatasError::KbUnavailable("Retries exhausted".to_string())))
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let cap_ms = MAX_DELAY.as_millis() as u64;
        let exp_ms = base_ms
            .saturating_mul(2_u64.saturating_pow(attempt - 1))
            .min(cap_ms);

        let jitter_range = (exp_ms as f64 * JITTER_FACTOR) as u64;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..=jitter_range)
        } else {
            0
        };

        Duration::from_millis((exp_ms + jitter).min(cap_ms))
    }
}
