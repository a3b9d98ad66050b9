//! Primary provider: commercial geocoding and truck routing over JSON REST,
//! authenticated with a query-string `apiKey`.

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ResolveError, Result};
use crate::geo::{polyline, Coordinate, GeocodeResult, RouteResult, RouteSource};
use crate::providers::{GeocodeProvider, RouteProvider};
use crate::transport::{HttpRequest, RetryingTransport};

/// Rate-limit resource shared by geocoding and routing calls.
pub const HERE_RESOURCE: &str = "here-api";

// == Response DTOs ==
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    items: Vec<GeocodeItem>,
}

#[derive(Debug, Deserialize)]
struct GeocodeItem {
    position: Position,
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Position {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoutesResponse {
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    sections: Vec<Section>,
}

#[derive(Debug, Deserialize)]
struct Section {
    summary: Summary,
    #[serde(default)]
    polyline: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    /// Meters
    length: f64,
    /// Seconds
    duration: f64,
}

// == Geocoder ==
/// Country-restricted geocoding against the primary provider.
pub struct HereGeocoder {
    transport: RetryingTransport,
    base_url: String,
    api_key: String,
    country: String,
}

impl HereGeocoder {
    pub fn new(
        transport: RetryingTransport,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            api_key: api_key.into(),
            country: country.into(),
        }
    }
}

#[async_trait]
impl GeocodeProvider for HereGeocoder {
    fn name(&self) -> &str {
        "here"
    }

    async fn geocode(&self, address: &str, cancel: &CancellationToken) -> Result<GeocodeResult> {
        debug!(provider = "here", address, "geocoding");
        let request = HttpRequest::get(&self.base_url)
            .param("q", address)
            .param("in", &self.country)
            .param("limit", "1")
            .param("apiKey", &self.api_key);

        let response: GeocodeResponse = self
            .transport
            .get_json(HERE_RESOURCE, &request, cancel)
            .await?;

        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NotFound(format!("no geocode results for '{}'", address)))?;

        let coordinate = Coordinate::new(item.position.lat, item.position.lng);
        if !coordinate.is_valid() {
            return Err(ResolveError::Malformed(format!(
                "position out of range for '{}'",
                address
            )));
        }

        Ok(GeocodeResult {
            lat: coordinate.lat,
            lng: coordinate.lng,
            normalized_address: item
                .address
                .and_then(|a| a.label)
                .unwrap_or_else(|| address.to_string()),
        })
    }
}

// == Router ==
/// Heavy-vehicle routing against the primary provider.
pub struct HereRouter {
    transport: RetryingTransport,
    base_url: String,
    api_key: String,
}

impl HereRouter {
    pub fn new(
        transport: RetryingTransport,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl RouteProvider for HereRouter {
    fn name(&self) -> &str {
        "here"
    }

    async fn route(
        &self,
        from: Coordinate,
        to: Coordinate,
        cancel: &CancellationToken,
    ) -> Result<RouteResult> {
        debug!(provider = "here", ?from, ?to, "routing");
        let request = HttpRequest::get(&self.base_url)
            .param("origin", from.to_query())
            .param("destination", to.to_query())
            .param("transportMode", "truck")
            .param("return", "summary,polyline")
            .param("apiKey", &self.api_key);

        let response: RoutesResponse = self
            .transport
            .get_json(HERE_RESOURCE, &request, cancel)
            .await?;

        let route = response
            .routes
            .into_iter()
            .next()
            .filter(|r| !r.sections.is_empty())
            .ok_or_else(|| ResolveError::NotFound("no truck route between endpoints".to_string()))?;

        let mut length_m = 0.0;
        let mut duration_s = 0.0;
        let mut geometry = Vec::new();
        for section in &route.sections {
            length_m += section.summary.length;
            duration_s += section.summary.duration;
            if let Some(encoded) = &section.polyline {
                geometry.extend(polyline::decode(encoded));
            }
        }

        if geometry.is_empty() {
            warn!("route geometry missing or undecodable, using endpoints only");
            geometry = vec![from, to];
        }

        Ok(RouteResult {
            distance_km: (length_m / 1000.0).round() as u32,
            duration_min: (duration_s / 60.0).round() as u32,
            geometry,
            source: RouteSource::Provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpClient, HttpResponse, RateLimiter, RetryPolicy};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    /// Always answers with one canned response and records requests.
    struct CannedClient {
        response: HttpResponse,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl CannedClient {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: HttpResponse {
                    status,
                    body: body.to_string(),
                },
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpClient for CannedClient {
        async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
            self.requests.lock().push(request.clone());
            Ok(self.response.clone())
        }
    }

    fn transport(client: Arc<CannedClient>) -> RetryingTransport {
        RetryingTransport::new(
            client,
            Arc::new(RateLimiter::new(100)),
            RetryPolicy::new(2, Duration::from_millis(10)),
        )
    }

    #[tokio::test]
    async fn test_geocode_uses_top_candidate_and_country_filter() {
        let client = CannedClient::new(
            200,
            r#"{"items":[
                {"position":{"lat":-23.5505,"lng":-46.6333},"address":{"label":"São Paulo, SP, Brasil"}},
                {"position":{"lat":0.0,"lng":0.0},"address":{"label":"Elsewhere"}}
            ]}"#,
        );
        let geocoder = HereGeocoder::new(transport(client.clone()), "http://here/geocode", "k", "countryCode:BRA");

        let result = geocoder.geocode("São Paulo", &CancellationToken::new()).await.unwrap();

        assert_eq!(result.normalized_address, "São Paulo, SP, Brasil");
        assert_eq!(result.lat, -23.5505);
        let request = client.requests.lock()[0].clone();
        assert_eq!(request.query_value("in"), Some("countryCode:BRA"));
        assert_eq!(request.query_value("q"), Some("São Paulo"));
        assert_eq!(request.query_value("apiKey"), Some("k"));
    }

    #[tokio::test]
    async fn test_geocode_empty_items_is_not_found() {
        let client = CannedClient::new(200, r#"{"items":[]}"#);
        let geocoder = HereGeocoder::new(transport(client), "http://here", "k", "countryCode:BRA");

        let result = geocoder.geocode("Atlantis", &CancellationToken::new()).await;
        assert!(matches!(result, Err(ResolveError::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_geocode_shape_mismatch_is_malformed_after_retries() {
        let client = CannedClient::new(200, r#"{"results":[]}"#);
        let geocoder = HereGeocoder::new(transport(client.clone()), "http://here", "k", "countryCode:BRA");

        let result = geocoder.geocode("Recife", &CancellationToken::new()).await;
        match result {
            Err(ResolveError::Exhausted { cause, .. }) => {
                assert!(matches!(*cause, ResolveError::Malformed(_)))
            }
            other => panic!("expected exhausted malformed, got {:?}", other),
        }
        assert_eq!(client.requests.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_route_parses_summary_and_polyline() {
        let client = CannedClient::new(
            200,
            r#"{"routes":[{"sections":[
                {"summary":{"length":200400,"duration":9000},"polyline":"_p~iF~ps|U_ulLnnqC"},
                {"summary":{"length":229700,"duration":10830},"polyline":"_mqNvxq`@"}
            ]}]}"#,
        );
        let router = HereRouter::new(transport(client.clone()), "http://here/routes", "k");

        let route = router
            .route(
                Coordinate::new(-23.5505, -46.6333),
                Coordinate::new(-22.9068, -43.1729),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(route.distance_km, 430);
        assert_eq!(route.duration_min, 331);
        assert_eq!(route.source, RouteSource::Provider);
        assert_eq!(route.geometry.len(), 3);

        let request = client.requests.lock()[0].clone();
        assert_eq!(request.query_value("transportMode"), Some("truck"));
        assert_eq!(request.query_value("origin"), Some("-23.5505,-46.6333"));
    }

    #[tokio::test]
    async fn test_route_without_geometry_uses_endpoints() {
        let client = CannedClient::new(
            200,
            r#"{"routes":[{"sections":[{"summary":{"length":1000,"duration":60},"polyline":"%%%"}]}]}"#,
        );
        let router = HereRouter::new(transport(client), "http://here/routes", "k");
        let from = Coordinate::new(1.0, 1.0);
        let to = Coordinate::new(2.0, 2.0);

        let route = router.route(from, to, &CancellationToken::new()).await.unwrap();
        assert_eq!(route.geometry, vec![from, to]);
        assert_eq!(route.distance_km, 1);
        assert_eq!(route.duration_min, 1);
    }

    #[tokio::test]
    async fn test_route_empty_is_not_found() {
        let client = CannedClient::new(200, r#"{"routes":[]}"#);
        let router = HereRouter::new(transport(client), "http://here/routes", "k");

        let result = router
            .route(Coordinate::new(1.0, 1.0), Coordinate::new(2.0, 2.0), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ResolveError::NotFound(_))));
    }
}
