//! Path factor caching with sliding expiration.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use dashmap::{DashMap, DashSet};
use fxroute_common::Currency;
use tracing::debug;

/// Separator between codes in a cache key.
pub const KEY_SEPARATOR: &str = "-";

/// Cached factor entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    factor: f64,
    last_accessed: DateTime<Utc>,
}

impl CacheEntry {
    fn new(factor: f64) -> Self {
        Self {
            factor,
            last_accessed: Utc::now(),
        }
    }

    fn is_valid(&self, sliding_expiration: Duration) -> bool {
        Utc::now().signed_duration_since(self.last_accessed) < sliding_expiration
    }

    fn touch(&mut self) {
        self.last_accessed = Utc::now();
    }
}

/// Configuration for the path cache.
#[derive(Debug, Clone)]
pub struct PathCacheConfig {
    /// Idle time after which an entry expires. Every hit resets it.
    pub sliding_expiration: Duration,
    /// Entry count at which expired entries are swept before inserting.
    pub max_entries: usize,
}

impl Default for PathCacheConfig {
    fn default() -> Self {
        Self {
            sliding_expiration: Duration::minutes(2),
            max_entries: 10_000,
        }
    }
}

/// Thread-safe cache from a path to its combined conversion factor.
///
/// Issued keys are tracked in their own set so `invalidate_all` removes
/// exactly what was handed out without walking the entry store. Expiry only
/// removes entries; a key stays tracked until the next invalidation, so an
/// entry re-inserted under it is never left untracked.
pub struct PathCache {
    entries: DashMap<String, CacheEntry>,
    keys: DashSet<String>,
    hits: AtomicU64,
    misses: AtomicU64,
    config: PathCacheConfig,
}

impl PathCache {
    /// Create a new path cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(PathCacheConfig::default())
    }

    /// Create a new path cache with custom configuration.
    pub fn with_config(config: PathCacheConfig) -> Self {
        Self {
            entries: DashMap::new(),
            keys: DashSet::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            config,
        }
    }

    /// Canonical, order-sensitive key for a path.
    pub fn key(path: &[Currency]) -> String {
        path.iter()
            .map(Currency::code)
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR)
    }

    /// Get a factor if present and not idle for too long.
    pub fn get(&self, key: &str) -> Option<f64> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.is_valid(self.config.sliding_expiration) {
                entry.touch();
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "Path cache hit");
                return Some(entry.factor);
            }

            debug!(key, "Path cache entry expired");
            drop(entry);
            // A concurrent insert may have refreshed the entry since the check.
            let expiration = self.config.sliding_expiration;
            self.entries.remove_if(key, |_, entry| !entry.is_valid(expiration));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key, "Path cache miss");
        None
    }

    /// Store the factor for a path key.
    pub fn insert(&self, key: String, factor: f64) {
        if self.entries.len() >= self.config.max_entries {
            self.evict_expired();
        }

        self.keys.insert(key.clone());
        self.entries.insert(key, CacheEntry::new(factor));
    }

    /// Remove every issued key and reset key tracking.
    pub fn invalidate_all(&self) {
        let mut removed = 0usize;
        for key in self.keys.iter() {
            if self.entries.remove(key.key()).is_some() {
                removed += 1;
            }
        }
        self.keys.clear();
        debug!(removed, "Path cache invalidated");
    }

    /// Drop entries that have been idle past the sliding window.
    pub fn evict_expired(&self) {
        let expiration = self.config.sliding_expiration;
        self.entries.retain(|_, entry| entry.is_valid(expiration));
    }

    /// Get the number of entries in cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let expiration = self.config.sliding_expiration;
        let total = self.entries.len();
        let valid = self
            .entries
            .iter()
            .filter(|e| e.is_valid(expiration))
            .count();

        CacheStats {
            total_entries: total,
            valid_entries: valid,
            expired_entries: total.saturating_sub(valid),
            tracked_keys: self.keys.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub tracked_keys: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups served from cache.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    fn path(codes: &[&str]) -> Vec<Currency> {
        codes.iter().map(|c| Currency::new(*c)).collect()
    }

    fn short_lived(millis: i64) -> PathCache {
        PathCache::with_config(PathCacheConfig {
            sliding_expiration: Duration::milliseconds(millis),
            ..Default::default()
        })
    }

    #[test]
    fn test_key_is_order_sensitive() {
        let forward = PathCache::key(&path(&["USD", "EUR", "GBP"]));
        let backward = PathCache::key(&path(&["GBP", "EUR", "USD"]));

        assert_eq!(forward, "USD-EUR-GBP");
        assert_ne!(forward, backward);
    }

    #[test]
    fn test_cache_insert_and_get() {
        let cache = PathCache::new();
        let key = PathCache::key(&path(&["USD", "EUR", "GBP"]));

        cache.insert(key.clone(), 0.78);

        assert_eq!(cache.get(&key), Some(0.78));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_miss() {
        let cache = PathCache::new();
        assert!(cache.get("USD-EUR").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = PathCache::new();
        cache.insert("USD-EUR-GBP".to_string(), 0.78);

        cache.get("USD-EUR-GBP");
        cache.get("USD-EUR-GBP");
        cache.get("USD-JPY-GBP");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_ratio() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_cache_expiry() {
        let cache = short_lived(50);
        cache.insert("USD-EUR-GBP".to_string(), 0.78);

        assert!(cache.get("USD-EUR-GBP").is_some());

        sleep(StdDuration::from_millis(80));

        assert!(cache.get("USD-EUR-GBP").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().tracked_keys, 1);
    }

    #[test]
    fn test_reinsert_after_expiry_is_invalidated() {
        let cache = short_lived(20);
        cache.insert("USD-EUR-GBP".to_string(), 0.78);
        sleep(StdDuration::from_millis(40));

        assert!(cache.get("USD-EUR-GBP").is_none());
        cache.insert("USD-EUR-GBP".to_string(), 0.80);
        cache.evict_expired();
        assert_eq!(cache.get("USD-EUR-GBP"), Some(0.80));

        cache.invalidate_all();
        assert!(cache.is_empty());
        assert!(cache.get("USD-EUR-GBP").is_none());
    }

    #[test]
    fn test_invalidate_after_concurrent_expire_and_reinsert() {
        let cache = short_lived(1);
        let keys: Vec<String> = (0..4).map(|i| format!("AAA-BB{i}-CCC")).collect();

        for _ in 0..50 {
            std::thread::scope(|scope| {
                for worker in 0..8 {
                    let cache = &cache;
                    let keys = &keys;
                    scope.spawn(move || {
                        for round in 0..200 {
                            let key = &keys[(worker + round) % keys.len()];
                            if cache.get(key).is_none() {
                                cache.insert(key.clone(), round as f64);
                            }
                            if round % 50 == 0 {
                                cache.evict_expired();
                            }
                        }
                    });
                }
            });

            cache.invalidate_all();
            assert!(cache.is_empty(), "entry escaped invalidation");
        }
    }

    #[test]
    fn test_access_slides_expiry() {
        let cache = short_lived(200);
        cache.insert("USD-EUR-GBP".to_string(), 0.78);

        // Each hit lands inside the window and pushes it forward.
        for _ in 0..4 {
            sleep(StdDuration::from_millis(100));
            assert!(cache.get("USD-EUR-GBP").is_some());
        }
    }

    #[test]
    fn test_invalidate_all() {
        let cache = PathCache::new();
        cache.insert("USD-EUR-GBP".to_string(), 0.78);
        cache.insert("JPY-USD-EUR".to_string(), 0.0061);

        cache.invalidate_all();

        assert!(cache.is_empty());
        assert!(cache.get("USD-EUR-GBP").is_none());
        assert_eq!(cache.stats().tracked_keys, 0);
    }

    #[test]
    fn test_evict_expired_at_capacity() {
        let cache = PathCache::with_config(PathCacheConfig {
            sliding_expiration: Duration::milliseconds(30),
            max_entries: 2,
        });
        cache.insert("AAA-BBB-CCC".to_string(), 1.0);
        cache.insert("BBB-CCC-DDD".to_string(), 2.0);

        sleep(StdDuration::from_millis(50));
        cache.insert("CCC-DDD-EEE".to_string(), 3.0);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("CCC-DDD-EEE"), Some(3.0));
    }
}
