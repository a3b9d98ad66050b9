//! Great-Circle Estimate Module
//!
//! Haversine distance and the synthesized straight-line route used when no
//! road route is available.

use crate::geo::{Coordinate, RouteResult, RouteSource};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Average truck speed assumed for estimated durations.
pub const AVERAGE_SPEED_KMH: f64 = 60.0;

const KM_PER_POINT: f64 = 50.0;
const MIN_POINTS: usize = 5;
const MAX_POINTS: usize = 20;

// == Haversine ==
/// Great-circle distance in kilometres, unrounded.
///
/// `a = sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlng/2)`,
/// `d = 2·R·atan2(√a, √(1−a))`.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlat = (to.lat - from.lat).to_radians();
    let dlng = (to.lng - from.lng).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

// == Estimate Route ==
/// Synthesizes a route from the great-circle distance.
///
/// Distance is rounded to whole kilometres, duration assumes
/// [`AVERAGE_SPEED_KMH`], and the geometry is a linear interpolation with
/// about one point per 50 km (between 5 and 20 points). This is a visual
/// approximation only; real road distance is typically up to ~30% longer.
pub fn estimate_route(from: Coordinate, to: Coordinate) -> RouteResult {
    let distance_km = haversine_km(from, to).round();
    let duration_min = (distance_km / AVERAGE_SPEED_KMH * 60.0).round();

    RouteResult {
        distance_km: distance_km as u32,
        duration_min: duration_min as u32,
        geometry: interpolate(from, to, point_count(distance_km)),
        source: RouteSource::Estimate,
    }
}

fn point_count(distance_km: f64) -> usize {
    ((distance_km / KM_PER_POINT).round() as usize).clamp(MIN_POINTS, MAX_POINTS)
}

/// `count` evenly spaced points from `from` to `to`, both included.
fn interpolate(from: Coordinate, to: Coordinate, count: usize) -> Vec<Coordinate> {
    let steps = (count.max(2) - 1) as f64;
    (0..count.max(2))
        .map(|i| {
            let t = i as f64 / steps;
            Coordinate::new(
                from.lat + (to.lat - from.lat) * t,
                from.lng + (to.lng - from.lng) * t,
            )
        })
        .collect()
}
