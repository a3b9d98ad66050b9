//! Error types for the resolution layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Resolve Error Enum ==
/// Unified error type for geocoding, routing and transport failures.
///
/// Errors are `Clone` so a single failed resolution can be fanned out to every
/// caller waiting on the same in-flight request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// Empty or identical origin/destination, or an otherwise unusable request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The per-resource rate limiter denied the call
    #[error("Rate limit exceeded for {resource}")]
    RateLimited { resource: String },

    /// Upstream answered successfully but had no usable result
    #[error("No results: {0}")]
    NotFound(String),

    /// A single HTTP attempt failed (network error or non-2xx status)
    #[error("Transport failure{}: {message}", status.map(|s| format!(" (status {})", s)).unwrap_or_default())]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// Upstream response did not match the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Every retry attempt failed; `cause` is the last attempt's error
    #[error("Retries exhausted after {attempts} attempts")]
    Exhausted {
        attempts: u32,
        #[source]
        cause: Box<ResolveError>,
    },

    /// The caller's cancellation token fired
    #[error("Resolution cancelled")]
    Cancelled,

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResolveError {
    // == Constructors ==
    /// Creates a transport error for a failed HTTP attempt.
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Creates a rate-limited error for the given resource.
    pub fn rate_limited(resource: impl Into<String>) -> Self {
        Self::RateLimited {
            resource: resource.into(),
        }
    }

    // == Classification ==
    /// Only single-attempt failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Malformed(_))
    }

    /// Returns true for the "valid response, empty result" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        let status = match &self {
            ResolveError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ResolveError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ResolveError::NotFound(_) => StatusCode::NOT_FOUND,
            ResolveError::Transport { .. }
            | ResolveError::Malformed(_)
            | ResolveError::Exhausted { .. } => StatusCode::BAD_GATEWAY,
            ResolveError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            ResolveError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the resolution layer.
pub type Result<T> = std::result::Result<T, ResolveError>;
