//! Retrying Transport Module
//!
//! Rate-limited HTTP access with exponential-backoff retry and typed JSON
//! decoding.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ResolveError, Result};
use crate::transport::{HttpClient, HttpRequest, RateLimiter};

// == Retry Policy ==
/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries including the first
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles after each failure
    pub base_delay: Duration,
    /// Cap for a single backoff sleep
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: Duration::from_secs(10),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            ..Self::new(
                config.retry_attempts,
                Duration::from_millis(config.retry_delay_ms),
            )
        }
    }

    /// Sleep after the zero-based `attempt` failed: `base * 2^attempt`, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

// == Retry With Backoff ==
/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `policy.max_attempts` attempts have failed.
///
/// The operation receives the zero-based attempt number. Cancellation is
/// checked before every attempt and interrupts backoff sleeps. Exhaustion
/// yields [`ResolveError::Exhausted`] carrying the last attempt's error.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let err = match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => err,
        };

        if attempt + 1 >= policy.max_attempts {
            return Err(ResolveError::Exhausted {
                attempts: attempt + 1,
                cause: Box::new(err),
            });
        }

        let delay = policy.delay_for(attempt);
        warn!(
            attempt = attempt + 1,
            max_attempts = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "attempt failed, backing off"
        );
        tokio::select! {
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}

// == Retrying Transport ==
/// Every outbound call goes through here: rate-limit check, HTTP attempt,
/// status and shape validation, backoff.
#[derive(Clone)]
pub struct RetryingTransport {
    client: Arc<dyn HttpClient>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl RetryingTransport {
    pub fn new(client: Arc<dyn HttpClient>, limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self {
            client,
            limiter,
            policy,
        }
    }

    // == Get JSON ==
    /// Sends `request` against `resource`'s rate-limit budget and decodes a
    /// 2xx body into `T`.
    ///
    /// The limiter is consulted before each attempt; a denial ends the call
    /// with [`ResolveError::RateLimited`] and no network traffic. Network
    /// failures, non-2xx statuses and bodies that do not decode into `T` are
    /// retried.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        request: &HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<T> {
        retry_with_backoff(&self.policy, cancel, |attempt| async move {
            if !self.limiter.check_and_consume(resource) {
                return Err(ResolveError::rate_limited(resource));
            }

            debug!(
                resource,
                url = %request.url,
                attempt = attempt + 1,
                remaining = self.limiter.remaining(resource),
                "sending request"
            );
            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
                response = self.client.execute(request) => response?,
            };

            if !response.is_success() {
                return Err(ResolveError::transport(
                    Some(response.status),
                    format!("{} returned status {}", resource, response.status),
                ));
            }

            serde_json::from_str::<T>(&response.body).map_err(|e| {
                ResolveError::Malformed(format!("unexpected {} response: {}", resource, e))
            })
        })
        .await
    }
}
