//! Bounded response cache with status-dependent expiration.
//!
//! [`ReferenceCache`] stores conclusive resolution responses keyed on the
//! canonical `"{repo}:{base_ref}"` form. Two properties distinguish it
//! from a plain LRU map:
//!
//! - **Differential TTLs.** A 200 response points at immutable release or
//!   commit data and is safe to keep for the long success TTL (default
//!   24 h). Anything else — upstream outage, a 404 that may be replication
//!   lag — expires under the short error TTL (default 1 h) so the next
//!   request retries the sources.
//! - **Lazy expiry.** Expiration is checked on read; an expired entry is
//!   removed on the spot and reported as a miss rather than waiting for
//!   capacity pressure to push it out.
//!
//! Capacity eviction is strict LRU: `get` refreshes recency, `put` on an
//! existing key replaces the value and refreshes recency, and the victim
//! of an overflow is always the least-recently-used entry. Each eviction
//! is reported to an optional observer for diagnostics; the observer must
//! not affect correctness.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lru::LruCache;
use tracing::debug;

use crate::telemetry;

/// Default maximum number of cached entries.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default time-to-live for 200 responses.
pub const DEFAULT_SUCCESS_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default time-to-live for non-200 responses.
pub const DEFAULT_ERROR_TTL: Duration = Duration::from_secs(60 * 60);

/// Configuration for the reference cache.
///
/// ```rust
/// # use muninn::cache::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .capacity(5_000)
///     .success_ttl(Duration::from_secs(12 * 60 * 60));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 1,000.
    pub capacity: usize,
    /// Time-to-live for 200 responses. Default: 24 hours.
    pub success_ttl: Duration,
    /// Time-to-live for non-200 responses. Default: 1 hour.
    pub error_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            success_ttl: DEFAULT_SUCCESS_TTL,
            error_ttl: DEFAULT_ERROR_TTL,
        }
    }
}

impl CacheConfig {
    /// Create a new config with the default capacity and TTLs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn capacity(mut self, n: usize) -> Self {
        self.capacity = n;
        self
    }

    /// Set the time-to-live for 200 responses.
    pub fn success_ttl(mut self, ttl: Duration) -> Self {
        self.success_ttl = ttl;
        self
    }

    /// Set the time-to-live for non-200 responses.
    pub fn error_ttl(mut self, ttl: Duration) -> Self {
        self.error_ttl = ttl;
        self
    }
}

/// A conclusive resolution response held in the cache.
///
/// Replaced wholesale on overwrite, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// HTTP status code of the conclusive response.
    pub status: u16,
    /// Response body, forwarded byte-for-byte on a hit.
    pub body: Vec<u8>,
    /// Unix timestamp (seconds) when the entry was stored.
    pub stored_at: u64,
}

impl CachedResponse {
    /// Create an entry stamped with the current time.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            body,
            stored_at: unix_now(),
        }
    }

    /// Expiry policy: a 200 entry expires after the success TTL, anything
    /// else after the error TTL. Expired iff `now` is strictly past the
    /// threshold.
    pub fn is_expired(&self, now: u64, config: &CacheConfig) -> bool {
        let ttl = if self.status == 200 {
            config.success_ttl
        } else {
            config.error_ttl
        };
        now > self.stored_at.saturating_add(ttl.as_secs())
    }
}

/// Current unix time in whole seconds.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Observer invoked with the key and value of each capacity-evicted entry.
pub type EvictionListener = Box<dyn Fn(&str, &CachedResponse) + Send + Sync>;

/// Thread-safe bounded LRU store for conclusive resolution responses.
///
/// At most one entry exists per canonical key. All operations synchronize
/// on a single internal mutex; none of them block on anything but the
/// lock itself.
pub struct ReferenceCache {
    inner: Mutex<LruCache<String, CachedResponse>>,
    config: CacheConfig,
    on_evict: Option<EvictionListener>,
}

impl ReferenceCache {
    /// Create a cache from `config`. A zero capacity is clamped to 1.
    pub fn new(config: CacheConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a cache that reports capacity evictions to `listener`.
    pub fn with_eviction_listener(config: CacheConfig, listener: EvictionListener) -> Self {
        Self::build(config, Some(listener))
    }

    fn build(config: CacheConfig, on_evict: Option<EvictionListener>) -> Self {
        let capacity =
            NonZeroUsize::new(config.capacity.max(1)).expect("capacity clamped to at least 1");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            config,
            on_evict,
        }
    }

    /// Look up `key`, applying the expiry policy.
    ///
    /// A live hit refreshes the entry's recency and returns a clone. An
    /// expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        let now = unix_now();
        let mut inner = self.inner.lock().expect("reference cache mutex poisoned");

        match inner.get(key) {
            None => {
                debug!(key, "cache miss");
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                return None;
            }
            Some(entry) if entry.is_expired(now, &self.config) => {
                // fall through to removal below
            }
            Some(entry) => {
                debug!(key, status = entry.status, stored_at = entry.stored_at, "cache hit");
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                return Some(entry.clone());
            }
        }

        if let Some(expired) = inner.pop(key) {
            debug!(key, stored_at = expired.stored_at, "cache entry expired");
            metrics::counter!(telemetry::CACHE_EXPIRED_TOTAL).increment(1);
        }
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        None
    }

    /// Insert (or overwrite) an entry.
    ///
    /// Overwriting an existing key replaces the value and refreshes its
    /// recency. When the cache is full, the least-recently-used entry is
    /// evicted and the eviction observer notified.
    pub fn put(&self, key: &str, value: CachedResponse) {
        let status = value.status;
        let mut inner = self.inner.lock().expect("reference cache mutex poisoned");

        if let Some((evicted_key, evicted)) = inner.push(key.to_string(), value) {
            // push returns the displaced entry; the same key coming back
            // means a plain overwrite, not an eviction.
            if evicted_key != key {
                debug!(key = %evicted_key, "evicted from cache");
                metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(1);
                if let Some(listener) = &self.on_evict {
                    listener(&evicted_key, &evicted);
                }
            }
        }
        debug!(key, status, "cached response");
    }

    /// Number of entries currently in the cache.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("reference cache mutex poisoned")
            .len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
