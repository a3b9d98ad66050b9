//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle for each endpoint against scripted
//! upstream providers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use geo_resolver::{
    create_router,
    transport::{HttpClient, HttpRequest, HttpResponse},
    AppState, Config, ResolutionFacade,
};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

// == Scripted Upstream ==

const PRIMARY_GEOCODE: &str = "http://primary.test/geocode";
const PRIMARY_ROUTES: &str = "http://primary.test/routes";
const FALLBACK_SEARCH: &str = "http://fallback.test/search";

/// Fake upstream: geocodes from a table keyed by the `q` parameter and
/// answers routing with a fixed status and body.
struct Upstream {
    primary_places: HashMap<&'static str, (f64, f64)>,
    fallback_places: HashMap<&'static str, (f64, f64)>,
    route_status: u16,
    calls: HashMap<&'static str, AtomicUsize>,
}

impl Upstream {
    fn new() -> Self {
        Self {
            primary_places: HashMap::from([
                ("Recife", (-8.0476, -34.877)),
                ("Olinda", (-8.0089, -34.8553)),
                ("Campinas", (-22.9056, -47.0608)),
            ]),
            fallback_places: HashMap::from([
                ("Recife", (-8.05, -34.88)),
                ("Caruaru", (-8.2849, -35.9699)),
            ]),
            route_status: 200,
            calls: [PRIMARY_GEOCODE, PRIMARY_ROUTES, FALLBACK_SEARCH]
                .into_iter()
                .map(|url| (url, AtomicUsize::new(0)))
                .collect(),
        }
    }

    fn with_route_status(mut self, status: u16) -> Self {
        self.route_status = status;
        self
    }

    fn calls(&self, url: &str) -> usize {
        self.calls[url].load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for Upstream {
    async fn execute(&self, request: &HttpRequest) -> geo_resolver::Result<HttpResponse> {
        if let Some(counter) = self.calls.get(request.url.as_str()) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        // Give concurrent callers a chance to pile up on the same key
        tokio::time::sleep(Duration::from_millis(20)).await;

        let q = request.query_value("q").unwrap_or_default();
        let (status, body) = match request.url.as_str() {
            PRIMARY_GEOCODE => {
                let items = match self.primary_places.get(q) {
                    Some((lat, lng)) => format!(
                        r#"[{{"position":{{"lat":{},"lng":{}}},"address":{{"label":"{}, Brasil"}}}}]"#,
                        lat, lng, q
                    ),
                    None => "[]".to_string(),
                };
                (200, format!(r#"{{"items":{}}}"#, items))
            }
            FALLBACK_SEARCH => {
                let places = match self.fallback_places.get(q) {
                    Some((lat, lng)) => format!(
                        r#"[{{"lat":"{}","lon":"{}","display_name":"{} (OSM)"}}]"#,
                        lat, lng, q
                    ),
                    None => "[]".to_string(),
                };
                (200, places)
            }
            PRIMARY_ROUTES => (
                self.route_status,
                r#"{"routes":[{"sections":[{"summary":{"length":102400,"duration":5430},"polyline":"_p~iF~ps|U_ulLnnqC"}]}]}"#
                    .to_string(),
            ),
            _ => (404, String::new()),
        };
        Ok(HttpResponse { status, body })
    }
}

// == Helper Functions ==

fn test_config(api_key: Option<&str>) -> Config {
    Config {
        api_key: api_key.map(str::to_string),
        retry_attempts: 2,
        retry_delay_ms: 1,
        fallback_delay_ms: 0,
        primary_geocode_url: PRIMARY_GEOCODE.to_string(),
        primary_route_url: PRIMARY_ROUTES.to_string(),
        fallback_geocode_url: FALLBACK_SEARCH.to_string(),
        ..Config::default()
    }
}

fn create_test_app(config: &Config, upstream: Arc<Upstream>) -> Router {
    let facade = ResolutionFacade::with_client(config, upstream);
    create_router(AppState::new(facade, CancellationToken::new()))
}

async fn send(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_reports_road_routing() {
    let app = create_test_app(&test_config(Some("key")), Arc::new(Upstream::new()));
    let (status, json) = send(&app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["roadRouting"], true);
}

// == Geocode Endpoint Tests ==

#[tokio::test]
async fn test_geocode_primary_then_cached() {
    let upstream = Arc::new(Upstream::new());
    let app = create_test_app(&test_config(Some("key")), upstream.clone());

    let (status, first) = send(&app, "GET", "/geocode?address=Recife").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["normalizedAddress"], "Recife, Brasil");
    assert_eq!(first["query"], "Recife");

    let (_, second) = send(&app, "GET", "/geocode?address=%20recife%20").await;
    assert_eq!(second["lat"], first["lat"]);
    assert_eq!(upstream.calls(PRIMARY_GEOCODE), 1);

    let (_, stats) = send(&app, "GET", "/stats").await;
    assert_eq!(stats["totalHits"], 1);
    assert_eq!(stats["totalRequests"], 2);
}

#[tokio::test]
async fn test_geocode_falls_back_to_public_provider() {
    let upstream = Arc::new(Upstream::new());
    let app = create_test_app(&test_config(Some("key")), upstream.clone());

    let (status, json) = send(&app, "GET", "/geocode?address=Caruaru").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["normalizedAddress"], "Caruaru (OSM)");
    assert_eq!(upstream.calls(PRIMARY_GEOCODE), 1);
    assert_eq!(upstream.calls(FALLBACK_SEARCH), 1);
}

#[tokio::test]
async fn test_geocode_without_key_skips_primary() {
    let upstream = Arc::new(Upstream::new());
    let app = create_test_app(&test_config(None), upstream.clone());

    let (status, json) = send(&app, "GET", "/geocode?address=Recife").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["normalizedAddress"], "Recife (OSM)");
    assert_eq!(upstream.calls(PRIMARY_GEOCODE), 0);
}

#[tokio::test]
async fn test_geocode_unknown_address_is_404() {
    let app = create_test_app(&test_config(Some("key")), Arc::new(Upstream::new()));
    let (status, json) = send(&app, "GET", "/geocode?address=Atlantis").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("Atlantis"));
}

#[tokio::test]
async fn test_concurrent_identical_requests_share_one_lookup() {
    let upstream = Arc::new(Upstream::new());
    let app = create_test_app(&test_config(Some("key")), upstream.clone());

    let (a, b, c) = tokio::join!(
        send(&app, "GET", "/geocode?address=Olinda"),
        send(&app, "GET", "/geocode?address=olinda"),
        send(&app, "GET", "/geocode?address=OLINDA"),
    );

    assert_eq!(a.1["lat"], b.1["lat"]);
    assert_eq!(b.1["lat"], c.1["lat"]);
    assert_eq!(upstream.calls(PRIMARY_GEOCODE), 1);
}

// == Route Endpoint Tests ==

#[tokio::test]
async fn test_route_with_road_router() {
    let upstream = Arc::new(Upstream::new());
    let app = create_test_app(&test_config(Some("key")), upstream.clone());

    let (status, json) = send(&app, "GET", "/route?origin=Recife&destination=Campinas").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "provider");
    assert_eq!(json["distanceKm"], 102);
    assert_eq!(json["durationMin"], 91);
    assert_eq!(json["geometry"].as_array().unwrap().len(), 2);
    assert_eq!(json["origin"], "Recife");

    send(&app, "GET", "/route?origin=recife&destination=campinas").await;
    assert_eq!(upstream.calls(PRIMARY_ROUTES), 1);
}

#[tokio::test]
async fn test_route_without_key_is_estimated() {
    let upstream = Arc::new(Upstream::new());
    let app = create_test_app(&test_config(None), upstream.clone());

    let (status, json) = send(&app, "GET", "/route?origin=Recife&destination=Caruaru").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "estimate");
    let distance = json["distanceKm"].as_u64().unwrap();
    assert!((110..=130).contains(&distance), "distance {}", distance);
    assert_eq!(json["durationMin"].as_u64().unwrap(), distance);
    assert_eq!(upstream.calls(PRIMARY_ROUTES), 0);
}

#[tokio::test]
async fn test_route_router_outage_degrades_to_estimate() {
    let upstream = Arc::new(Upstream::new().with_route_status(503));
    let app = create_test_app(&test_config(Some("key")), upstream.clone());

    let (status, json) = send(&app, "GET", "/route?origin=Recife&destination=Olinda").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "estimate");
    // Two attempts per the retry policy
    assert_eq!(upstream.calls(PRIMARY_ROUTES), 2);
}

#[tokio::test]
async fn test_route_identical_endpoints_is_400() {
    let app = create_test_app(&test_config(Some("key")), Arc::new(Upstream::new()));
    let (status, json) = send(&app, "GET", "/route?origin=Recife&destination=%20RECIFE").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_route_rate_limited_is_429() {
    let upstream = Arc::new(Upstream::new());
    let config = Config {
        rate_limit_per_minute: 3,
        ..test_config(Some("key"))
    };
    let app = create_test_app(&config, upstream.clone());

    // Two geocodes and one route use up the primary budget
    let (status, _) = send(&app, "GET", "/route?origin=Recife&destination=Olinda").await;
    assert_eq!(status, StatusCode::OK);

    // Caruaru still geocodes through the fallback, the router is denied
    let (status, json) = send(&app, "GET", "/route?origin=Recife&destination=Caruaru").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(json["error"].as_str().unwrap().contains("here-api"));
    assert_eq!(upstream.calls(PRIMARY_ROUTES), 1);
    assert_eq!(upstream.calls(FALLBACK_SEARCH), 1);
}

// == Cache Endpoint Tests ==

#[tokio::test]
async fn test_clear_cache_by_prefix() {
    let app = create_test_app(&test_config(Some("key")), Arc::new(Upstream::new()));
    send(&app, "GET", "/route?origin=Recife&destination=Olinda").await;

    let (status, json) = send(&app, "DELETE", "/cache?prefix=route").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], 1);
    assert_eq!(json["prefix"], "route");

    let (_, json) = send(&app, "DELETE", "/cache").await;
    assert_eq!(json["cleared"], 2);
    assert_eq!(json["prefix"], Value::Null);
}

#[tokio::test]
async fn test_stats_shape() {
    let app = create_test_app(&test_config(Some("key")), Arc::new(Upstream::new()));
    let (status, json) = send(&app, "GET", "/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["size"], 0);
    assert_eq!(json["maxSize"], 100);
    assert_eq!(json["hitRate"], 0.0);
    assert!(json.get("averageAccessTimeMs").is_some());
    assert_eq!(json["evictions"]["lru"], 0);
}
