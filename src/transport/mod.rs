//! Transport Module
//!
//! Outbound HTTP plumbing: per-resource rate limiting, the HTTP client seam
//! and the retrying transport every provider call goes through.

mod client;
pub mod rate_limit;
mod retry;

pub use client::{HttpClient, HttpRequest, HttpResponse, ReqwestClient, USER_AGENT};
pub use rate_limit::RateLimiter;
pub use retry::{retry_with_backoff, RetryPolicy, RetryingTransport};
