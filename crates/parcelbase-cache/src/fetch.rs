//! Timeout, retry and read-through combinators.
//!
//! Composition order is fixed across the application:
//! `with_cache(key, || with_retry(|| with_timeout(op)))`. A cache hit skips
//! the network entirely; retries apply only to genuinely failed attempts,
//! including timed-out ones.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::store::CacheStore;
use parcelbase_core::{CoreError, Result};

/// Race `future` against a timer.
///
/// If the timer elapses first the future is dropped — the attempt is
/// cancelled, its side effects do not occur — and a `Timeout` error carrying
/// `message` is returned.
pub async fn with_timeout<T>(
    future: impl Future<Output = Result<T>>,
    timeout: Duration,
    message: &str,
) -> Result<T> {
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, message, "operation timed out");
            Err(CoreError::timeout(message))
        }
    }
}

/// Run `operation` up to `retries + 1` times.
///
/// Non-retryable failures (permission, validation, not-found) are returned
/// immediately with no delay. Between retryable attempts the delay grows
/// linearly: `base_delay * attempt_index`, index starting at 1. The last
/// observed error is returned when attempts are exhausted.
pub async fn with_retry<T, F, Fut>(mut operation: F, retries: u32, base_delay: Duration) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    for attempt in 0..=retries {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt == retries || !error.is_retryable() {
                    return Err(error);
                }
                let delay = base_delay * (attempt + 1);
                tracing::warn!(
                    attempt = attempt + 1,
                    retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    unreachable!("loop returns on the final attempt")
}

/// Read-through cache: serve `key` from `cache` when fresh, otherwise run
/// `operation`, store its result under `key` with `ttl`, and return it.
///
/// A failed operation propagates unchanged and populates nothing.
pub async fn with_cache<T, F, Fut>(
    cache: &CacheStore,
    key: &str,
    ttl: Duration,
    operation: F,
) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(value) = cache.get(key).await {
        tracing::debug!(key, "cache hit");
        return Ok(serde_json::from_value(value)?);
    }

    tracing::debug!(key, "cache miss, fetching");
    let result = operation().await?;
    cache.put(key, serde_json::to_value(&result)?, ttl).await;
    Ok(result)
}

/// The timeout/retry knobs of one fetch path, bundled so services can carry
/// them around as configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Deadline for a single attempt.
    pub timeout: Duration,
    /// Additional attempts after the first.
    pub retries: u32,
    /// First retry delay; subsequent delays grow linearly.
    pub base_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl FetchPolicy {
    /// Override the retry count.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Run `operation` under this policy: each attempt bounded by
    /// [`timeout`](Self::timeout), transient failures retried.
    pub async fn run<T, F, Fut>(&self, timeout_message: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        with_retry(
            || with_timeout(operation(), self.timeout, timeout_message),
            self.retries,
            self.base_delay,
        )
        .await
    }
}
