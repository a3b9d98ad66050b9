//! Routing resolver: geocodes both endpoints, then asks the road router or
//! falls back to the great-circle estimate.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::{normalize, CacheKey, CacheOptions, ResponseCache};
use crate::error::{ResolveError, Result};
use crate::geo::{estimate_route, Coordinate, RouteResult};
use crate::providers::RouteProvider;
use crate::resolver::{GeocodingResolver, Resolution};

pub struct RoutingResolver {
    geocoder: Arc<GeocodingResolver>,
    router: Option<Arc<dyn RouteProvider>>,
    cache: Arc<ResponseCache<Resolution>>,
    ttl: Duration,
}

impl RoutingResolver {
    /// # Arguments
    /// * `geocoder` - Resolves each endpoint (independently cached)
    /// * `router` - Road router; `None` always uses the estimate
    /// * `cache` - Shared response cache
    /// * `ttl` - Lifetime of cached route results
    pub fn new(
        geocoder: Arc<GeocodingResolver>,
        router: Option<Arc<dyn RouteProvider>>,
        cache: Arc<ResponseCache<Resolution>>,
        ttl: Duration,
    ) -> Self {
        Self {
            geocoder,
            router,
            cache,
            ttl,
        }
    }

    pub fn has_router(&self) -> bool {
        self.router.is_some()
    }

    // == Resolve ==
    /// Resolves the route between two free-text addresses.
    ///
    /// Fails with `InvalidInput` when either side is empty or both normalize
    /// to the same address. Endpoint geocoding runs concurrently and either
    /// failure fails the whole call.
    pub async fn resolve(
        &self,
        origin: &str,
        destination: &str,
        cancel: &CancellationToken,
    ) -> Result<RouteResult> {
        let origin = origin.trim();
        let destination = destination.trim();
        if origin.is_empty() || destination.is_empty() {
            return Err(ResolveError::InvalidInput(
                "origin and destination are required".to_string(),
            ));
        }
        if normalize(origin) == normalize(destination) {
            return Err(ResolveError::InvalidInput(
                "origin and destination must differ".to_string(),
            ));
        }

        let key = CacheKey::route(origin, destination);
        self.cache
            .cache_around(
                &key,
                self.ttl,
                || async {
                    let (from, to) = tokio::try_join!(
                        self.geocoder.resolve(origin, cancel),
                        self.geocoder.resolve(destination, cancel),
                    )?;
                    self.route_between(from.coordinate(), to.coordinate(), cancel)
                        .await
                        .map(Resolution::Route)
                },
                CacheOptions::resilient(),
            )
            .await?
            .into_route()
    }

    // == Route Between ==
    /// Routes between two coordinates without caching.
    ///
    /// With a router, `NotFound` and upstream failures degrade to the
    /// estimate; rate limiting and cancellation propagate. The estimate's
    /// straight-line distance understates road distance by up to about 30%.
    pub async fn route_between(
        &self,
        from: Coordinate,
        to: Coordinate,
        cancel: &CancellationToken,
    ) -> Result<RouteResult> {
        let Some(router) = &self.router else {
            debug!("no road router configured, estimating route");
            return Ok(estimate_route(from, to));
        };

        match router.route(from, to, cancel).await {
            Ok(route) => Ok(route),
            Err(err @ (ResolveError::RateLimited { .. } | ResolveError::Cancelled)) => Err(err),
            Err(err) => {
                warn!(router = router.name(), error = %err, "road routing failed, using great-circle estimate");
                Ok(estimate_route(from, to))
            }
        }
    }
}
