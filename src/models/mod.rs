//! Request and response models for the resolution API
//!
//! Query-string DTOs for incoming requests and the JSON bodies returned by
//! each endpoint.

pub mod requests;
pub mod responses;

pub use requests::{ClearCacheQuery, GeocodeQuery, RouteQuery};
pub use responses::{
    ClearCacheResponse, ErrorResponse, GeocodeResponse, HealthResponse, RouteResponse,
};
