//! Geo Module
//!
//! Coordinate and result types shared by the resolvers, plus polyline
//! decoding and the great-circle route estimate.

pub mod estimate;
pub mod polyline;

use serde::{Deserialize, Serialize};

pub use estimate::{estimate_route, haversine_km, AVERAGE_SPEED_KMH, EARTH_RADIUS_KM};

// == Coordinate ==
/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and inside the latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// `"lat,lng"`, the form routing endpoints expect.
    pub fn to_query(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

// == Geocode Result ==
/// A resolved address: the top candidate's position and label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeResult {
    pub lat: f64,
    pub lng: f64,
    pub normalized_address: String,
}

impl GeocodeResult {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

// == Route Result ==
/// Which path produced a [`RouteResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    /// Road route from the routing provider
    Provider,
    /// Straight-line great-circle approximation; understates road distance
    /// by up to roughly 30%
    Estimate,
}

/// Distance, duration and geometry between two points.
///
/// `geometry` runs start to end: the first point approximates the origin and
/// the last the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub distance_km: u32,
    pub duration_min: u32,
    pub geometry: Vec<Coordinate>,
    pub source: RouteSource,
}

impl RouteResult {
    pub fn is_estimate(&self) -> bool {
        self.source == RouteSource::Estimate
    }
}
