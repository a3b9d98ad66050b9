//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and
//! access latency.

use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;

/// Number of latency samples kept for the average.
pub const LATENCY_SAMPLES: usize = 100;

// == Eviction Counts ==
/// Evictions broken down by the sweep step that removed the entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvictionCounts {
    pub expired: u64,
    pub idle: u64,
    pub low_value: u64,
    pub lru: u64,
}

impl EvictionCounts {
    pub fn total(&self) -> u64 {
        self.expired + self.idle + self.low_value + self.lru
    }
}

// == Cache Stats ==
/// Point-in-time view of cache performance.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Current number of entries in the cache
    pub size: usize,
    /// Configured entry cap
    pub max_size: usize,
    /// totalHits / totalRequests, or 0.0 before any request
    pub hit_rate: f64,
    /// Number of `get` calls
    pub total_requests: u64,
    /// Number of `get` calls served from a valid entry
    pub total_hits: u64,
    /// Number of `get` calls that missed
    pub misses: u64,
    /// Average hit latency over the most recent samples
    pub average_access_time_ms: f64,
    pub evictions: EvictionCounts,
}

// == Cache Metrics ==
/// Mutable counters owned by the cache store.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    total_requests: u64,
    total_hits: u64,
    evictions: EvictionCounts,
    /// Ring buffer of hit latencies in milliseconds
    latencies: VecDeque<f64>,
}

impl CacheMetrics {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            latencies: VecDeque::with_capacity(LATENCY_SAMPLES),
            ..Self::default()
        }
    }

    // == Record Request ==
    /// Counts a `get` call, hit or miss.
    pub fn record_request(&mut self) {
        self.total_requests += 1;
    }

    // == Record Hit ==
    /// Counts a hit and keeps its latency sample.
    pub fn record_hit(&mut self, latency: Duration) {
        self.total_hits += 1;
        if self.latencies.len() == LATENCY_SAMPLES {
            self.latencies.pop_front();
        }
        self.latencies.push_back(latency.as_secs_f64() * 1000.0);
    }

    pub fn evictions_mut(&mut self) -> &mut EvictionCounts {
        &mut self.evictions
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / requests, or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_hits as f64 / self.total_requests as f64
        }
    }

    pub fn average_access_time_ms(&self) -> f64 {
        if self.latencies.is_empty() {
            0.0
        } else {
            self.latencies.iter().sum::<f64>() / self.latencies.len() as f64
        }
    }

    #[cfg(test)]
    pub fn sample_count(&self) -> usize {
        self.latencies.len()
    }

    // == Snapshot ==
    pub fn snapshot(&self, size: usize, max_size: usize) -> CacheStats {
        CacheStats {
            size,
            max_size,
            hit_rate: self.hit_rate(),
            total_requests: self.total_requests,
            total_hits: self.total_hits,
            misses: self.total_requests - self.total_hits,
            average_access_time_ms: self.average_access_time_ms(),
            evictions: self.evictions,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let stats = CacheMetrics::new().snapshot(0, 100);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.total_hits, 0);
        assert_eq!(stats.evictions.total(), 0);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.average_access_time_ms, 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut metrics = CacheMetrics::new();
        metrics.record_request();
        metrics.record_hit(Duration::from_millis(2));
        metrics.record_request();

        let stats = metrics.snapshot(1, 100);
        assert_eq!(stats.hit_rate, 0.5);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_latency_average() {
        let mut metrics = CacheMetrics::new();
        metrics.record_hit(Duration::from_millis(2));
        metrics.record_hit(Duration::from_millis(4));
        assert!((metrics.average_access_time_ms() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_latency_ring_buffer_is_bounded() {
        let mut metrics = CacheMetrics::new();
        for _ in 0..LATENCY_SAMPLES {
            metrics.record_hit(Duration::from_millis(100));
        }
        for _ in 0..LATENCY_SAMPLES {
            metrics.record_hit(Duration::from_millis(1));
        }

        assert_eq!(metrics.sample_count(), LATENCY_SAMPLES);
        // Only the most recent samples count
        assert!((metrics.average_access_time_ms() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_eviction_totals() {
        let mut metrics = CacheMetrics::new();
        metrics.evictions_mut().expired += 2;
        metrics.evictions_mut().lru += 1;
        assert_eq!(metrics.snapshot(0, 10).evictions.total(), 3);
    }
}
