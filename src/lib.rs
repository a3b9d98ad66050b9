//! Geo Resolver - geocoding and route resolution for freight calculators
//!
//! Turns free-text origin/destination pairs into distance, duration and route
//! geometry over rate-limited, retrying provider calls, with a shared
//! response cache in front.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod providers;
pub mod resolver;
pub mod transport;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{ResolveError, Result};
pub use geo::{Coordinate, GeocodeResult, RouteResult, RouteSource};
pub use resolver::ResolutionFacade;
