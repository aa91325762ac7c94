//! Translation caching.
//!
//! Provides an LRU cache with TTL expiration for completed translations,
//! keyed by the full [`TranslationRequest`]. Lookups compare requests by
//! equality, so two requests that share a hash never share an entry.
//! Thread-safe using `Mutex` for LRU operations. Built queries are immutable,
//! so cached values are handed out as clones.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::config::CacheConfig;
use crate::result::{Translation, TranslationRequest};

/// A cached translation with expiration tracking.
#[derive(Debug, Clone)]
struct CacheEntry {
    translation: Translation,
    created_at: Instant,
}

impl CacheEntry {
    fn new(translation: Translation) -> Self {
        Self {
            translation,
            created_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Thread-safe LRU cache with TTL expiration for translations.
///
/// # Features
///
/// - **LRU Eviction**: When the cache is full, the least recently used entry is evicted.
/// - **TTL Expiration**: Entries expire after the configured time-to-live.
/// - **Thread-Safe**: Uses `Mutex` for safe concurrent access.
pub struct TranslationCache<K = TranslationRequest> {
    inner: Mutex<LruCache<K, CacheEntry>>,
    ttl: Duration,
}

impl<K: Hash + Eq + Clone> TranslationCache<K> {
    /// Creates a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_capacity(config.max_entries, config.ttl)
    }

    /// Creates a cache with custom capacity and TTL. A zero capacity is
    /// treated as one.
    pub fn with_capacity(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Gets a cached translation.
    ///
    /// Returns `None` if the key is absent or the entry has expired. On a hit
    /// the entry is promoted to most-recently-used.
    pub fn get(&self, key: &K) -> Option<Translation> {
        let mut cache = self.inner.lock().ok()?;

        if let Some(entry) = cache.get(key) {
            if entry.is_expired(self.ttl) {
                cache.pop(key);
                return None;
            }
            return Some(entry.translation.clone());
        }

        None
    }

    /// Stores a translation, evicting the least recently used entry if full.
    pub fn set(&self, key: K, translation: Translation) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.put(key, CacheEntry::new(translation));
        }
    }

    /// Checks if a key exists (without affecting LRU order or checking expiry).
    pub fn contains(&self, key: &K) -> bool {
        match self.inner.lock() {
            Ok(cache) => cache.contains(key),
            _ => false,
        }
    }

    /// Number of entries, possibly including expired ones.
    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(cache) => cache.len(),
            _ => 0,
        }
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all entries.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.clear();
        }
    }

    /// Removes expired entries.
    pub fn cleanup_expired(&self) {
        if let Ok(mut cache) = self.inner.lock() {
            let ttl = self.ttl;
            let expired: Vec<K> = cache
                .iter()
                .filter(|(_, entry)| entry.is_expired(ttl))
                .map(|(key, _)| key.clone())
                .collect();

            for key in expired {
                cache.pop(&key);
            }
        }
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        match self.inner.lock() {
            Ok(cache) => {
                let total = cache.len();
                let expired = cache
                    .iter()
                    .filter(|(_, entry)| entry.is_expired(self.ttl))
                    .count();

                CacheStats {
                    total_entries: total,
                    expired_entries: expired,
                    valid_entries: total.saturating_sub(expired),
                }
            }
            _ => CacheStats::default(),
        }
    }
}

impl<K: Hash + Eq + Clone> std::fmt::Debug for TranslationCache<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("TranslationCache")
            .field("entries", &stats.total_entries)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Statistics about the cache state.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Total number of entries in the cache.
    pub total_entries: usize,
    /// Number of expired entries (not yet cleaned up).
    pub expired_entries: usize,
    /// Number of valid (non-expired) entries.
    pub valid_entries: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{QueryGroup, QueryItem};
    use crate::result::TranslationStats;
    use fedquery_criteria::{factory, Relation, SearchQuery};
    use std::hash::Hasher;
    use std::sync::Arc;
    use std::thread;

    fn translation(age: i64) -> Translation {
        let criterion = factory::simple_expression(Relation::Ge, "age", age);
        Translation {
            query: SearchQuery::builder("Person", criterion).build().unwrap(),
            skipped_items: Vec::new(),
            stats: TranslationStats::default(),
        }
    }

    fn request(key: &str) -> TranslationRequest {
        TranslationRequest::new(vec![QueryGroup::new(vec![QueryItem::new(key)])])
    }

    /// A key whose every value hashes the same.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct SameHash(u32);

    impl Hash for SameHash {
        fn hash<H: Hasher>(&self, state: &mut H) {
            state.write_u64(42);
        }
    }

    fn cache_for<K: Hash + Eq + Clone>(max_entries: usize, ttl: Duration) -> TranslationCache<K> {
        TranslationCache::with_capacity(max_entries, ttl)
    }

    #[test]
    fn test_cache_set_get() {
        let cache: TranslationCache = cache_for(100, Duration::from_secs(300));
        let key = request("\\\\i2b2\\Labs\\LOINC\\2345-7\\");
        cache.set(key.clone(), translation(40));

        let cached = cache.get(&key).expect("Should have cached value");
        assert_eq!(cached.query, translation(40).query);
    }

    #[test]
    fn test_cache_miss() {
        let cache: TranslationCache = TranslationCache::new(CacheConfig::default());
        assert!(cache.get(&request("\\\\i2b2\\Labs\\")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_distinct_requests_do_not_share_entries() {
        let cache: TranslationCache = cache_for(100, Duration::from_secs(300));
        let paged = request("\\\\i2b2\\Labs\\").with_page(0, 10);
        cache.set(request("\\\\i2b2\\Labs\\"), translation(1));

        assert!(cache.get(&paged).is_none());
    }

    #[test]
    fn test_equal_hashes_keep_separate_entries() {
        let cache = cache_for(100, Duration::from_secs(300));
        cache.set(SameHash(1), translation(1));
        cache.set(SameHash(2), translation(2));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&SameHash(1)).unwrap().query, translation(1).query);
        assert_eq!(cache.get(&SameHash(2)).unwrap().query, translation(2).query);
        assert!(cache.get(&SameHash(3)).is_none());
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let cache = cache_for(0, Duration::from_secs(300));
        cache.set(1u64, translation(1));
        cache.set(2u64, translation(2));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&2));
    }

    #[test]
    fn test_lru_eviction() {
        let cache = cache_for(2, Duration::from_secs(300));
        cache.set(1u64, translation(1));
        cache.set(2u64, translation(2));

        let _ = cache.get(&1);
        cache.set(3u64, translation(3));

        assert!(cache.get(&1).is_some());
        assert!(cache.get(&2).is_none());
        assert!(cache.get(&3).is_some());
    }

    #[test]
    fn test_ttl_expiration() {
        let cache = cache_for(100, Duration::from_millis(50));
        cache.set(1u64, translation(1));
        assert!(cache.get(&1).is_some());

        thread::sleep(Duration::from_millis(100));

        assert!(cache.get(&1).is_none());
    }

    #[test]
    fn test_cleanup_and_stats() {
        let cache = cache_for(100, Duration::from_millis(50));
        cache.set(1u64, translation(1));
        cache.set(2u64, translation(2));
        assert_eq!(cache.stats().valid_entries, 2);

        thread::sleep(Duration::from_millis(100));
        assert_eq!(cache.stats().expired_entries, 2);

        cache.cleanup_expired();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(cache_for(1000, Duration::from_secs(300)));
        let mut handles = vec![];

        for thread_id in 0..8u64 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..10u64 {
                    let key = thread_id * 100 + i;
                    cache.set(key, translation(key as i64));
                    assert!(cache.get(&key).is_some());
                }
            }));
        }

        for handle in handles {
            handle.join().expect("Thread panicked");
        }
        assert_eq!(cache.len(), 80);
    }
}
