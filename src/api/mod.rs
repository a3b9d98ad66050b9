//! API Module
//!
//! HTTP handlers and routing for the resolution REST API.
//!
//! # Endpoints
//! - `GET /geocode?address=` - Resolve an address to coordinates
//! - `GET /route?origin=&destination=` - Distance, duration and geometry
//! - `DELETE /cache?prefix=` - Clear cached results
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
