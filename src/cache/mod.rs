//! Cache Module
//!
//! Provides the in-memory response cache with TTL, usage-aware and LRU
//! eviction, stale reads, request coalescing and hit/miss analytics.

mod around;
mod entry;
mod key;
mod stats;
mod store;


// Re-export public types
pub use around::CacheOptions;
pub use entry::CacheEntry;
pub use key::{normalize, CacheKey, GEOCODE_PREFIX, ROUTE_PREFIX};
pub use stats::{CacheMetrics, CacheStats, EvictionCounts, LATENCY_SAMPLES};
pub use store::{CachePolicy, ResponseCache};
