//! Rate Limiter Module
//!
//! Fixed-window request counting per outbound resource.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::warn;

/// Length of a rate-limit window.
pub const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    window_start: Instant,
}

// == Rate Limiter ==
/// One fixed 60-second window per logical resource (e.g. `"here-api"`).
///
/// A denied check has no side effect and there is no queuing: callers treat
/// `false` as a signal to fail fast.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
    limits: HashMap<String, u32>,
    default_limit: u32,
}

impl RateLimiter {
    // == Constructor ==
    /// Creates a limiter allowing `default_limit` requests per window for
    /// every resource without an explicit limit.
    pub fn new(default_limit: u32) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            limits: HashMap::new(),
            default_limit,
        }
    }

    /// Sets a dedicated limit for one resource.
    pub fn with_limit(mut self, resource: impl Into<String>, limit: u32) -> Self {
        self.limits.insert(resource.into(), limit);
        self
    }

    pub fn limit_for(&self, resource: &str) -> u32 {
        self.limits
            .get(resource)
            .copied()
            .unwrap_or(self.default_limit)
    }

    // == Check And Consume ==
    /// Returns `true` and counts the request if `resource` still has budget in
    /// its current window, `false` otherwise.
    pub fn check_and_consume(&self, resource: &str) -> bool {
        let limit = self.limit_for(resource);
        let now = Instant::now();
        let mut windows = self.windows.lock();
        let window = windows.entry(resource.to_string()).or_insert(Window {
            count: 0,
            window_start: now,
        });

        if now.saturating_duration_since(window.window_start) >= WINDOW {
            window.count = 0;
            window.window_start = now;
        }

        if window.count >= limit {
            warn!(resource, limit, "rate limit reached for current window");
            return false;
        }

        window.count += 1;
        true
    }

    /// Requests still allowed for `resource` in its current window.
    pub fn remaining(&self, resource: &str) -> u32 {
        let limit = self.limit_for(resource);
        let windows = self.windows.lock();
        match windows.get(resource) {
            Some(window) if window.window_start.elapsed() < WINDOW => {
                limit.saturating_sub(window.count)
            }
            _ => limit,
        }
    }
}
