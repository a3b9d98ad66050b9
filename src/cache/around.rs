//! Cache-Around Module
//!
//! Wraps a producer future with cache lookup, request coalescing and stale
//! fallback. This is the entry point the resolvers use.

use std::future::Future;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::cache::{CacheKey, ResponseCache};
use crate::error::{ResolveError, Result};

// == Options ==
/// Per-call behaviour for [`ResponseCache::cache_around`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Skip the cache lookup and always run the producer
    pub force_refresh: bool,
    /// On producer failure, answer with an expired-but-retained entry if any
    pub fallback_on_error: bool,
}

impl CacheOptions {
    /// Cache lookups with stale fallback, the resolvers' default.
    pub fn resilient() -> Self {
        Self {
            force_refresh: false,
            fallback_on_error: true,
        }
    }
}

/// Removes the in-flight registration when the leader finishes or is dropped.
struct InFlightGuard<'a, T: Clone> {
    cache: &'a ResponseCache<T>,
    key: &'a CacheKey,
    sender: Option<broadcast::Sender<Result<T>>>,
}

impl<T: Clone> InFlightGuard<'_, T> {
    fn complete(mut self, result: &Result<T>) {
        self.cache.in_flight.lock().remove(self.key.as_str());
        if let Some(sender) = self.sender.take() {
            // No receivers is fine
            let _ = sender.send(result.clone());
        }
    }
}

impl<T: Clone> Drop for InFlightGuard<'_, T> {
    fn drop(&mut self) {
        if self.sender.is_some() {
            self.cache.in_flight.lock().remove(self.key.as_str());
        }
    }
}

enum Role<T> {
    /// A leader finished between the cache miss and registration
    Ready(T),
    Leader(broadcast::Sender<Result<T>>),
    Follower(broadcast::Receiver<Result<T>>),
}

impl<T: Clone + Send> ResponseCache<T> {
    // == Cache Around ==
    /// Returns the cached value for `key`, or runs `producer` and caches its
    /// result for `ttl`.
    ///
    /// Concurrent callers for the same missing key share a single producer
    /// run: the first becomes the leader, the rest wait for its result. If the
    /// producer fails and `fallback_on_error` is set, a retained stale entry is
    /// returned instead of the error. Cancellation is never masked by stale
    /// data, and a leader's cancellation is not passed on: followers whose
    /// own token is live run the producer themselves.
    pub async fn cache_around<F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        producer: F,
        options: CacheOptions,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !options.force_refresh {
            if let Some(value) = self.get(key) {
                return Ok(value);
            }
        }

        match self.join_or_lead(key, options) {
            Role::Ready(value) => Ok(value),
            Role::Follower(mut receiver) => {
                debug!(key = %key, "joining in-flight resolution");
                match receiver.recv().await {
                    Ok(Err(ResolveError::Cancelled)) | Err(_) => {
                        debug!(key = %key, "in-flight leader gave up, producing");
                        self.produce(key, ttl, producer, options).await
                    }
                    Ok(result) => result,
                }
            }
            Role::Leader(sender) => {
                let guard = InFlightGuard {
                    cache: self,
                    key,
                    sender: Some(sender),
                };
                let result = self.produce(key, ttl, producer, options).await;
                guard.complete(&result);
                result
            }
        }
    }

    fn join_or_lead(&self, key: &CacheKey, options: CacheOptions) -> Role<T> {
        let mut in_flight = self.in_flight.lock();
        if let Some(sender) = in_flight.get(key.as_str()) {
            return Role::Follower(sender.subscribe());
        }
        // Leaders store before deregistering, so this sees their value
        if !options.force_refresh {
            if let Some(value) = self.peek_valid(key) {
                return Role::Ready(value);
            }
        }
        let (sender, _) = broadcast::channel(1);
        in_flight.insert(key.as_str().to_string(), sender.clone());
        Role::Leader(sender)
    }

    async fn produce<F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        producer: F,
        options: CacheOptions,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match producer().await {
            Ok(value) => {
                self.set(key, value.clone(), ttl);
                Ok(value)
            }
            Err(ResolveError::Cancelled) => Err(ResolveError::Cancelled),
            Err(err) if options.fallback_on_error => match self.get_stale(key) {
                Some(stale) => {
                    warn!(key = %key, error = %err, "resolution failed, serving stale cache entry");
                    Ok(stale)
                }
                None => Err(err),
            },
            Err(err) => Err(err),
        }
    }
}
