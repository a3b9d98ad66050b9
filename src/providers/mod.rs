//! Providers Module
//!
//! Upstream geocoding and routing APIs behind small async traits, with typed
//! response DTOs per provider.

pub mod here;
pub mod nominatim;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::geo::{Coordinate, GeocodeResult, RouteResult};

pub use here::{HereGeocoder, HereRouter, HERE_RESOURCE};
pub use nominatim::{NominatimGeocoder, NOMINATIM_RESOURCE};

/// Resolves a free-text address to its top candidate.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Returns [`crate::error::ResolveError::NotFound`] when the provider
    /// answered with no candidates.
    async fn geocode(&self, address: &str, cancel: &CancellationToken) -> Result<GeocodeResult>;
}

/// Computes a road route between two coordinates.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
        cancel: &CancellationToken,
    ) -> Result<RouteResult>;
}
