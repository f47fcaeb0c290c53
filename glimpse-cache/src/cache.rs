//! In-memory TTL cache for profiles.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use glimpse_core::constants::{DEFAULT_CACHE_TTL_SECONDS, MAX_CACHE_TTL_SECONDS};

use crate::clock::{Clock, SystemClock};

/// Cache entry with an absolute expiry.
#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL applied by [`TtlCache::put_default`], in seconds
    pub default_ttl_seconds: u64,
    /// Optional entry bound; `None` leaves cleanup purely time-based.
    /// A bound of 0 behaves as 1: the newest insert is always stored.
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            max_entries: None,
        }
    }
}

impl CacheConfig {
    /// Sets the default TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_seconds = ttl.as_secs();
        self
    }

    /// Bounds the number of stored entries (at least 1).
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }
}

/// Normalizes a lookup key: surrounding whitespace dropped, lowercased.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// In-memory key/value cache with per-entry expiry.
///
/// Thread-safe. Readers never observe an expired entry, whether or not the
/// sweeper has removed it yet. Values are cloned out; the cache keeps sole
/// ownership of what it stores.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
}

impl<V: Clone> TtlCache<V> {
    /// Creates a cache with default configuration and the system clock.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration and the system clock.
    pub fn with_config(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            config,
        }
    }

    /// Returns the value stored under `key` if it has not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let normalized = normalize_key(key);
        let now = self.clock.now();
        let entries = self.entries.read();
        entries
            .get(&normalized)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone())
    }

    /// Inserts or overwrites `key`, expiring `ttl` from now.
    ///
    /// TTLs longer than [`MAX_CACHE_TTL_SECONDS`] are clamped to it.
    pub fn put(&self, key: &str, value: V, ttl: Duration) {
        let ttl = ttl.min(Duration::from_secs(MAX_CACHE_TTL_SECONDS));
        let normalized = normalize_key(key);
        let now = self.clock.now();
        let mut entries = self.entries.write();

        if let Some(max) = self.config.max_entries {
            if entries.len() >= max && !entries.contains_key(&normalized) {
                entries.retain(|_, e| e.is_live(now));
            }
            if entries.len() >= max && !entries.contains_key(&normalized) {
                if let Some(soonest) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.expires_at)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&soonest);
                }
            }
        }

        entries.insert(
            normalized,
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }

    /// Inserts or overwrites `key` with the configured default TTL.
    pub fn put_default(&self, key: &str, value: V) {
        self.put(key, value, self.default_ttl());
    }

    /// Removes every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        before - entries.len()
    }

    /// The configured default TTL.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.config.default_ttl_seconds)
    }

    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| !e.is_live(now)).count();
        CacheStats {
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len() - expired,
            capacity: self.config.max_entries,
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Expired entries not yet swept
    pub expired_entries: usize,
    /// Valid (non-expired) entries
    pub valid_entries: usize,
    /// Entry bound, if any
    pub capacity: Option<usize>,
}
