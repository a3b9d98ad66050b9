//! Resolution facade: the composition root that owns the cache, the rate
//! limiter and the provider chain, and exposes the operations the rest of
//! the application calls.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::{CachePolicy, CacheStats, ResponseCache};
use crate::config::Config;
use crate::error::Result;
use crate::geo::{GeocodeResult, RouteResult};
use crate::providers::{
    GeocodeProvider, HereGeocoder, HereRouter, NominatimGeocoder, RouteProvider,
    NOMINATIM_RESOURCE,
};
use crate::resolver::{GeocodingResolver, Resolution, RoutingResolver};
use crate::transport::{HttpClient, RateLimiter, ReqwestClient, RetryPolicy, RetryingTransport};

pub struct ResolutionFacade {
    cache: Arc<ResponseCache<Resolution>>,
    geocoder: Arc<GeocodingResolver>,
    router: RoutingResolver,
}

impl ResolutionFacade {
    /// Builds the facade with a real HTTP client.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ReqwestClient::new(config.request_timeout())?;
        Ok(Self::with_client(config, Arc::new(client)))
    }

    /// Builds the facade over any [`HttpClient`].
    ///
    /// Without an API key the primary geocoder is left out of the chain and
    /// routing always uses the great-circle estimate.
    pub fn with_client(config: &Config, client: Arc<dyn HttpClient>) -> Self {
        let limiter = Arc::new(
            RateLimiter::new(config.rate_limit_per_minute)
                .with_limit(NOMINATIM_RESOURCE, config.fallback_rate_limit),
        );
        let transport = RetryingTransport::new(client, limiter, RetryPolicy::from_config(config));
        let cache = Arc::new(ResponseCache::with_policy(CachePolicy::with_max_size(
            config.cache_max_size,
        )));

        let mut providers: Vec<Arc<dyn GeocodeProvider>> = Vec::new();
        let mut road_router: Option<Arc<dyn RouteProvider>> = None;
        if let Some(key) = &config.api_key {
            providers.push(Arc::new(HereGeocoder::new(
                transport.clone(),
                &config.primary_geocode_url,
                key,
                &config.geocode_country,
            )));
            road_router = Some(Arc::new(HereRouter::new(
                transport.clone(),
                &config.primary_route_url,
                key,
            )));
        }
        providers.push(Arc::new(NominatimGeocoder::new(
            transport,
            &config.fallback_geocode_url,
            config.fallback_delay(),
        )));

        let geocoder = Arc::new(GeocodingResolver::new(
            providers,
            cache.clone(),
            config.geocode_ttl(),
        ));
        info!(
            providers = ?geocoder.provider_names(),
            road_routing = road_router.is_some(),
            max_size = config.cache_max_size,
            "resolution facade ready"
        );
        let router = RoutingResolver::new(geocoder.clone(), road_router, cache.clone(), config.route_ttl());

        Self {
            cache,
            geocoder,
            router,
        }
    }

    // == Operations ==
    /// Resolves a free-text address.
    pub async fn geocode(&self, address: &str, cancel: &CancellationToken) -> Result<GeocodeResult> {
        self.geocoder.resolve(address, cancel).await
    }

    /// Resolves distance, duration and geometry between two addresses.
    pub async fn calculate_route(
        &self,
        origin: &str,
        destination: &str,
        cancel: &CancellationToken,
    ) -> Result<RouteResult> {
        self.router.resolve(origin, destination, cancel).await
    }

    /// Removes cached results, all of them or only keys starting with
    /// `prefix`. Returns how many were removed.
    pub fn clear_cache(&self, prefix: Option<&str>) -> usize {
        let cleared = self.cache.clear(prefix);
        info!(prefix = prefix.unwrap_or("*"), cleared, "cache cleared");
        cleared
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn has_road_router(&self) -> bool {
        self.router.has_router()
    }
}
