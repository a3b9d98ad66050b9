//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and usage tracking.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// Represents a single cache entry with value and usage metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Creation instant
    pub created_at: Instant,
    /// Time-to-live measured from `created_at`
    pub ttl: Duration,
    /// Number of cache hits served by this entry
    pub access_count: u64,
    /// Last time the entry was created or served as a hit
    pub last_accessed_at: Instant,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current instant.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - How long the entry stays valid
    pub fn new(value: T, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            created_at: now,
            ttl,
            access_count: 0,
            last_accessed_at: now,
        }
    }

    // == Validity ==
    /// Checks whether the entry is still within its TTL.
    ///
    /// An entry is valid while `now - created_at <= ttl`; the boundary instant
    /// itself still counts as valid.
    pub fn is_valid_at(&self, now: Instant) -> bool {
        self.age_at(now) <= self.ttl
    }

    /// Time elapsed since creation.
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// Time elapsed since the last hit (or creation).
    pub fn idle_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_accessed_at)
    }

    /// How long the entry has been past its TTL, zero while still valid.
    pub fn expired_for_at(&self, now: Instant) -> Duration {
        self.age_at(now).saturating_sub(self.ttl)
    }

    /// Returns remaining TTL, or zero once expired.
    pub fn ttl_remaining_at(&self, now: Instant) -> Duration {
        self.ttl.saturating_sub(self.age_at(now))
    }

    // == Touch ==
    /// Records a hit on this entry.
    pub fn touch(&mut self, now: Instant) {
        self.access_count += 1;
        self.last_accessed_at = now;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_creation() {
        let entry = CacheEntry::new("sao paulo", Duration::from_secs(60));

        assert_eq!(entry.value, "sao paulo");
        assert_eq!(entry.access_count, 0);
        assert_eq!(entry.created_at, entry.last_accessed_at);
        assert!(entry.is_valid_at(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_validity_boundary() {
        let entry = CacheEntry::new(1u8, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(entry.is_valid_at(Instant::now()), "exact TTL is still valid");

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!entry.is_valid_at(Instant::now()));
        assert_eq!(entry.expired_for_at(Instant::now()), Duration::from_millis(1));
        assert_eq!(entry.ttl_remaining_at(Instant::now()), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_updates_usage() {
        let mut entry = CacheEntry::new(1u8, Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(5)).await;
        entry.touch(Instant::now());

        assert_eq!(entry.access_count, 1);
        assert_eq!(entry.idle_at(Instant::now()), Duration::ZERO);
        assert_eq!(entry.age_at(Instant::now()), Duration::from_secs(5));
        assert_eq!(entry.ttl_remaining_at(Instant::now()), Duration::from_secs(55));
    }
}
