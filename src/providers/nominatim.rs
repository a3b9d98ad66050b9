//! Fallback geocoder backed by a public OpenStreetMap search endpoint.
//!
//! The public instance asks for at most one request per second, so every call
//! waits a fixed delay first and draws from its own rate-limit resource.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::geo::{Coordinate, GeocodeResult};
use crate::providers::GeocodeProvider;
use crate::transport::{HttpRequest, RetryingTransport};

pub const NOMINATIM_RESOURCE: &str = "nominatim";

/// Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    display_name: String,
}

pub struct NominatimGeocoder {
    transport: RetryingTransport,
    base_url: String,
    delay: Duration,
}

impl NominatimGeocoder {
    /// # Arguments
    /// * `delay` - Politeness pause taken before every request
    pub fn new(transport: RetryingTransport, base_url: impl Into<String>, delay: Duration) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            delay,
        }
    }
}

fn parse_degrees(raw: &str, field: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ResolveError::Malformed(format!("{} is not a number: '{}'", field, raw)))
}

#[async_trait]
impl GeocodeProvider for NominatimGeocoder {
    fn name(&self) -> &str {
        "nominatim"
    }

    async fn geocode(&self, address: &str, cancel: &CancellationToken) -> Result<GeocodeResult> {
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {}
            _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
        }

        debug!(provider = "nominatim", address, "geocoding");
        let request = HttpRequest::get(&self.base_url)
            .param("q", address)
            .param("format", "json")
            .param("limit", "1");

        let places: Vec<Place> = self
            .transport
            .get_json(NOMINATIM_RESOURCE, &request, cancel)
            .await?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NotFound(format!("no geocode results for '{}'", address)))?;

        let coordinate = Coordinate::new(
            parse_degrees(&place.lat, "lat")?,
            parse_degrees(&place.lon, "lon")?,
        );
        if !coordinate.is_valid() {
            return Err(ResolveError::Malformed(format!(
                "position out of range for '{}'",
                address
            )));
        }

        Ok(GeocodeResult {
            lat: coordinate.lat,
            lng: coordinate.lng,
            normalized_address: place.display_name,
        })
    }
}
