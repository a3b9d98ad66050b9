//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with TTL, usage-aware and LRU
//! eviction. The eviction sweep runs opportunistically on every `get` and
//! `set`; there is no background timer.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, CacheMetrics, CacheStats};
use crate::error::Result;

// == Cache Policy ==
/// Eviction thresholds for the sweep.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Maximum number of entries kept after a sweep
    pub max_size: usize,
    /// Entries unused for longer than this are removed regardless of TTL
    pub idle_timeout: Duration,
    /// Entries older than this with too few hits are removed
    pub low_value_grace: Duration,
    /// Hits needed for an entry to survive the grace period
    pub low_value_min_hits: u64,
    /// How long an expired entry stays around for stale reads
    pub stale_window: Duration,
}

impl CachePolicy {
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::default()
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_size: 100,
            idle_timeout: Duration::from_secs(60 * 60),
            low_value_grace: Duration::from_secs(30 * 60),
            low_value_min_hits: 2,
            stale_window: Duration::from_secs(60 * 60),
        }
    }
}

// == Slot ==
/// An entry plus its position in access order.
#[derive(Debug)]
struct Slot<T> {
    entry: CacheEntry<T>,
    /// Monotonic access sequence; lowest = least recently used
    seq: u64,
}

#[derive(Debug)]
struct CacheState<T> {
    entries: HashMap<String, Slot<T>>,
    metrics: CacheMetrics,
    next_seq: u64,
}

impl<T> CacheState<T> {
    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

// == Response Cache ==
/// Process-wide response cache with TTL, idle, low-value and LRU eviction,
/// stale reads and hit/miss analytics.
///
/// All synchronous operations take a short internal lock that is never held
/// across an `.await`.
pub struct ResponseCache<T> {
    state: Mutex<CacheState<T>>,
    /// Leaders of in-progress `cache_around` productions, keyed by cache key
    pub(super) in_flight: Mutex<HashMap<String, broadcast::Sender<Result<T>>>>,
    policy: CachePolicy,
}

impl<T: Clone> ResponseCache<T> {
    // == Constructor ==
    /// Creates a cache holding at most `max_size` entries with default thresholds.
    pub fn new(max_size: usize) -> Self {
        Self::with_policy(CachePolicy::with_max_size(max_size))
    }

    /// Creates a cache with explicit eviction thresholds.
    pub fn with_policy(mut policy: CachePolicy) -> Self {
        policy.max_size = policy.max_size.max(1);
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                metrics: CacheMetrics::new(),
                next_seq: 0,
            }),
            in_flight: Mutex::new(HashMap::new()),
            policy,
        }
    }

    // == Get ==
    /// Retrieves a valid (non-expired) value by key.
    ///
    /// Counts a request, and on a hit records the access latency, increments
    /// the entry's access count and refreshes its recency. Expired entries are
    /// misses but stay available to [`ResponseCache::get_stale`].
    pub fn get(&self, key: &CacheKey) -> Option<T> {
        let started = std::time::Instant::now();
        let mut state = self.state.lock();
        let now = Instant::now();
        self.sweep_locked(&mut state, now);
        state.metrics.record_request();

        let seq = state.bump_seq();
        let value = match state.entries.get_mut(key.as_str()) {
            Some(slot) if slot.entry.is_valid_at(now) => {
                slot.entry.touch(now);
                slot.seq = seq;
                Some((slot.entry.value.clone(), slot.entry.ttl_remaining_at(now)))
            }
            _ => None,
        };

        match value {
            Some((value, ttl_left)) => {
                state.metrics.record_hit(started.elapsed());
                debug!(key = %key, ttl_remaining_s = ttl_left.as_secs(), "cache hit");
                Some(value)
            }
            None => {
                debug!(key = %key, "cache miss");
                None
            }
        }
    }

    // == Get Stale ==
    /// Retrieves a value regardless of its TTL, as long as it has not been
    /// evicted. Does not count as a request and does not refresh recency.
    pub fn get_stale(&self, key: &CacheKey) -> Option<T> {
        let state = self.state.lock();
        state
            .entries
            .get(key.as_str())
            .map(|slot| slot.entry.value.clone())
    }

    /// Valid value for `key` without touching stats or recency.
    pub(super) fn peek_valid(&self, key: &CacheKey) -> Option<T> {
        let state = self.state.lock();
        state
            .entries
            .get(key.as_str())
            .filter(|slot| slot.entry.is_valid_at(Instant::now()))
            .map(|slot| slot.entry.value.clone())
    }

    // == Set ==
    /// Stores a value with the given TTL.
    ///
    /// If the key already exists, the entry is replaced and its usage reset.
    /// The sweep then brings the cache back under `max_size`.
    pub fn set(&self, key: &CacheKey, value: T, ttl: Duration) {
        let mut state = self.state.lock();
        let seq = state.bump_seq();
        state.entries.insert(
            key.as_str().to_string(),
            Slot {
                entry: CacheEntry::new(value, ttl),
                seq,
            },
        );
        self.sweep_locked(&mut state, Instant::now());
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether it existed.
    pub fn delete(&self, key: &CacheKey) -> bool {
        self.state.lock().entries.remove(key.as_str()).is_some()
    }

    // == Clear ==
    /// Removes every entry whose key starts with `prefix`, or every entry when
    /// no prefix is given. Returns the number of entries removed.
    pub fn clear(&self, prefix: Option<&str>) -> usize {
        let mut state = self.state.lock();
        let before = state.entries.len();
        match prefix {
            Some(prefix) => state.entries.retain(|key, _| !key.starts_with(prefix)),
            None => state.entries.clear(),
        }
        before - state.entries.len()
    }

    // == Sweep ==
    /// Runs the eviction sweep now. Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let mut state = self.state.lock();
        self.sweep_locked(&mut state, Instant::now())
    }

    /// Removes, in order: entries expired beyond the stale window, idle
    /// entries, low-value entries, then least recently used entries until the
    /// cache is at or under `max_size`.
    fn sweep_locked(&self, state: &mut CacheState<T>, now: Instant) -> usize {
        let policy = &self.policy;
        let before = state.entries.len();

        let expired = remove_where(&mut state.entries, |entry| {
            !entry.is_valid_at(now) && entry.expired_for_at(now) > policy.stale_window
        });
        let idle = remove_where(&mut state.entries, |entry| {
            entry.idle_at(now) > policy.idle_timeout
        });
        let low_value = remove_where(&mut state.entries, |entry| {
            entry.access_count < policy.low_value_min_hits
                && entry.age_at(now) > policy.low_value_grace
        });

        let mut lru = 0;
        if state.entries.len() > policy.max_size {
            let mut by_recency: Vec<(u64, String)> = state
                .entries
                .iter()
                .map(|(key, slot)| (slot.seq, key.clone()))
                .collect();
            by_recency.sort_unstable();
            let excess = state.entries.len() - policy.max_size;
            for (_, key) in by_recency.into_iter().take(excess) {
                state.entries.remove(&key);
                lru += 1;
            }
        }

        let evictions = state.metrics.evictions_mut();
        evictions.expired += expired;
        evictions.idle += idle;
        evictions.low_value += low_value;
        evictions.lru += lru;

        let removed = before - state.entries.len();
        if removed > 0 {
            debug!(expired, idle, low_value, lru, "cache sweep evicted entries");
        }
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        state
            .metrics
            .snapshot(state.entries.len(), self.policy.max_size)
    }

    // == Length ==
    /// Returns the current number of entries in the cache, including entries
    /// kept only for stale reads.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}

fn remove_where<T>(
    entries: &mut HashMap<String, Slot<T>>,
    mut predicate: impl FnMut(&CacheEntry<T>) -> bool,
) -> u64 {
    let before = entries.len();
    entries.retain(|_, slot| !predicate(&slot.entry));
    (before - entries.len()) as u64
}
