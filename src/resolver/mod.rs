//! Resolver Module
//!
//! Geocoding and routing resolution on top of the providers and the shared
//! response cache, plus the facade that wires them together from config.

mod facade;
mod geocode;
mod route;

use serde::{Deserialize, Serialize};

use crate::error::{ResolveError, Result};
use crate::geo::{GeocodeResult, RouteResult};

pub use facade::ResolutionFacade;
pub use geocode::GeocodingResolver;
pub use route::RoutingResolver;

/// Payload of the process-wide cache. Keys are prefixed per operation, so a
/// key only ever holds the variant its resolver stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Resolution {
    Geocode(GeocodeResult),
    Route(RouteResult),
}

impl Resolution {
    pub fn into_geocode(self) -> Result<GeocodeResult> {
        match self {
            Resolution::Geocode(result) => Ok(result),
            Resolution::Route(_) => Err(ResolveError::Malformed(
                "cached route found under a geocode key".to_string(),
            )),
        }
    }

    pub fn into_route(self) -> Result<RouteResult> {
        match self {
            Resolution::Route(result) => Ok(result),
            Resolution::Geocode(_) => Err(ResolveError::Malformed(
                "cached geocode found under a route key".to_string(),
            )),
        }
    }
}
