//! Response DTOs for the resolution API
//!
//! Defines the JSON bodies returned by each endpoint. Field names are
//! camelCase to match the browser client.

use serde::Serialize;

use crate::geo::{GeocodeResult, RouteResult};

/// Response body for `GET /geocode`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResponse {
    /// The address as it was requested
    pub query: String,
    #[serde(flatten)]
    pub result: GeocodeResult,
}

impl GeocodeResponse {
    pub fn new(query: impl Into<String>, result: GeocodeResult) -> Self {
        Self {
            query: query.into(),
            result,
        }
    }
}

/// Response body for `GET /route`
///
/// `source` tells the client whether the numbers come from a road route or
/// the straight-line estimate.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub origin: String,
    pub destination: String,
    #[serde(flatten)]
    pub route: RouteResult,
}

impl RouteResponse {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, route: RouteResult) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            route,
        }
    }
}

/// Response body for `DELETE /cache`
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    /// Number of entries removed
    pub cleared: usize,
    /// Prefix that was cleared, `null` for everything
    pub prefix: Option<String>,
}

impl ClearCacheResponse {
    pub fn new(cleared: usize, prefix: Option<&str>) -> Self {
        Self {
            cleared,
            prefix: prefix.map(str::to_string),
        }
    }
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in RFC 3339 format
    pub timestamp: String,
    /// Whether a road router is configured or routes are estimated
    pub road_routing: bool,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(road_routing: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            road_routing,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
