//! API Handlers
//!
//! HTTP request handlers for each resolution endpoint.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use tokio_util::sync::CancellationToken;

use crate::cache::CacheStats;
use crate::config::Config;
use crate::error::Result;
use crate::models::{
    ClearCacheQuery, ClearCacheResponse, GeocodeQuery, GeocodeResponse, HealthResponse,
    RouteQuery, RouteResponse,
};
use crate::resolver::ResolutionFacade;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub facade: Arc<ResolutionFacade>,
    /// Cancelled on server shutdown; each request resolves under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(facade: ResolutionFacade, shutdown: CancellationToken) -> Self {
        Self {
            facade: Arc::new(facade),
            shutdown,
        }
    }

    /// Creates a new AppState from configuration, with a real HTTP client.
    pub fn from_config(config: &Config, shutdown: CancellationToken) -> Result<Self> {
        Ok(Self::new(ResolutionFacade::from_config(config)?, shutdown))
    }
}

/// Handler for GET /geocode?address=
pub async fn geocode_handler(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<GeocodeResponse>> {
    let cancel = state.shutdown.child_token();
    let result = state.facade.geocode(&query.address, &cancel).await?;

    Ok(Json(GeocodeResponse::new(query.address, result)))
}

/// Handler for GET /route?origin=&destination=
pub async fn route_handler(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<RouteResponse>> {
    let cancel = state.shutdown.child_token();
    let route = state
        .facade
        .calculate_route(&query.origin, &query.destination, &cancel)
        .await?;

    Ok(Json(RouteResponse::new(query.origin, query.destination, route)))
}

/// Handler for DELETE /cache?prefix=
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    Query(query): Query<ClearCacheQuery>,
) -> Json<ClearCacheResponse> {
    let prefix = query.prefix();
    let cleared = state.facade.clear_cache(prefix);

    Json(ClearCacheResponse::new(cleared, prefix))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.facade.cache_stats())
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.facade.has_road_router()))
}
