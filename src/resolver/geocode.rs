//! Geocoding resolver: cached lookup over an ordered provider chain.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::{CacheKey, CacheOptions, ResponseCache};
use crate::error::{ResolveError, Result};
use crate::geo::GeocodeResult;
use crate::providers::GeocodeProvider;
use crate::resolver::Resolution;

pub struct GeocodingResolver {
    providers: Vec<Arc<dyn GeocodeProvider>>,
    cache: Arc<ResponseCache<Resolution>>,
    ttl: Duration,
}

impl GeocodingResolver {
    /// # Arguments
    /// * `providers` - Tried in order; the first success wins
    /// * `cache` - Shared response cache
    /// * `ttl` - Lifetime of cached geocode results
    pub fn new(
        providers: Vec<Arc<dyn GeocodeProvider>>,
        cache: Arc<ResponseCache<Resolution>>,
        ttl: Duration,
    ) -> Self {
        Self {
            providers,
            cache,
            ttl,
        }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    // == Resolve ==
    /// Resolves `address` to its top candidate.
    ///
    /// The cache key uses the normalized address while providers receive the
    /// trimmed original. A failed resolution falls back to a stale cache
    /// entry when one is retained.
    pub async fn resolve(&self, address: &str, cancel: &CancellationToken) -> Result<GeocodeResult> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ResolveError::InvalidInput(
                "address must not be empty".to_string(),
            ));
        }

        let key = CacheKey::geocode(address);
        self.cache
            .cache_around(
                &key,
                self.ttl,
                || async {
                    self.resolve_uncached(address, cancel)
                        .await
                        .map(Resolution::Geocode)
                },
                CacheOptions::resilient(),
            )
            .await?
            .into_geocode()
    }

    /// Walks the provider chain. Every failure except cancellation moves on
    /// to the next provider. If all fail, the result is `NotFound` when each
    /// provider came back empty, otherwise the last real failure.
    async fn resolve_uncached(
        &self,
        address: &str,
        cancel: &CancellationToken,
    ) -> Result<GeocodeResult> {
        let mut not_found = None;
        let mut last_failure = None;

        for provider in &self.providers {
            match provider.geocode(address, cancel).await {
                Ok(result) => {
                    debug!(provider = provider.name(), address, "geocoded");
                    return Ok(result);
                }
                Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
                Err(err) => {
                    warn!(provider = provider.name(), address, error = %err, "geocoding provider failed");
                    if err.is_not_found() {
                        not_found = Some(err);
                    } else {
                        last_failure = Some(err);
                    }
                }
            }
        }

        Err(last_failure.or(not_found).unwrap_or_else(|| {
            ResolveError::NotFound(format!("no geocoding provider for '{}'", address))
        }))
    }
}
