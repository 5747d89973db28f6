//! Path resolution cache
//!
//! LRU plus TTL cache mapping (document id, path) to a resolved entry index.
//! The cache is purely an accelerator: expired or evicted entries are
//! re-resolved against the document, so a cached lookup always returns the
//! same node an uncached [`Node::path`] call would.
//!
//! Documents are immutable, which keeps invalidation trivial: an entry can
//! only stop being served by aging out or being evicted.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::document::Document;
use crate::node::Node;

/// Tuning for a [`PathCache`].
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Maximum number of cached resolutions before LRU eviction.
    pub capacity: usize,
    /// How long a cached resolution stays valid.
    pub ttl: Duration,
}

impl CacheConfig {
    pub const fn new(capacity: usize, ttl: Duration) -> Self {
        Self { capacity, ttl }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            ttl: Duration::from_secs(60),
        }
    }
}

/// Hit and miss counters since cache construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// A document never changes, so its id plus the path string pins the result.
#[derive(Hash, PartialEq, Eq)]
struct PathKey {
    doc: u64,
    path: Box<str>,
}

#[derive(Clone, Copy)]
struct CachedResolution {
    index: u32,
    inserted_at: Instant,
    ttl: Duration,
}

impl CachedResolution {
    fn is_fresh(&self) -> bool {
        self.inserted_at.elapsed() < self.ttl
    }
}

/// Shared cache of resolved paths, safe to use from multiple threads.
pub struct PathCache {
    inner: Mutex<LruCache<PathKey, CachedResolution>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PathCache {
    /// Create a cache. A zero capacity is clamped to one entry.
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Resolve a path from the document root, consulting the cache first.
    /// Absent results are cached too.
    pub fn resolve<'a>(&self, doc: &'a Document, path: &str) -> Node<'a> {
        self.resolve_with_ttl(doc, path, self.config.ttl)
    }

    /// Resolve with a TTL other than the configured default.
    pub fn resolve_with_ttl<'a>(&self, doc: &'a Document, path: &str, ttl: Duration) -> Node<'a> {
        let key = PathKey {
            doc: doc.id(),
            path: Box::from(path),
        };

        if let Ok(mut cache) = self.inner.lock() {
            match cache.get(&key) {
                Some(cached) if cached.is_fresh() => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    tracing::trace!(path, "path cache hit");
                    return Node::new(doc, cached.index);
                }
                Some(_) => {
                    cache.pop(&key);
                }
                None => {}
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(path, "path cache miss");
        let node = doc.path(path);
        let resolution = CachedResolution {
            index: node.entry_index(),
            inserted_at: Instant::now(),
            ttl,
        };
        if let Ok(mut cache) = self.inner.lock() {
            cache.put(key, resolution);
        }
        node
    }

    /// Counters accumulated since construction.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Number of cached resolutions, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached resolution. Counters keep their values.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.clear();
        }
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(input: &str) -> Document {
        Document::parse(input).unwrap()
    }

    #[test]
    fn test_cached_resolution_matches_uncached() {
        let doc = doc("{\"a\": {\"b\": [1, 2, 3]}}");
        let cache = PathCache::default();

        let first = cache.resolve(&doc, "a.b.1");
        let second = cache.resolve(&doc, "a.b.1");
        assert_eq!(first, doc.path("a.b.1"));
        assert_eq!(second, first);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_absent_resolution_is_cached() {
        let doc = doc("{\"a\": 1}");
        let cache = PathCache::default();

        assert!(!cache.resolve(&doc, "a.b.c").exists());
        assert!(!cache.resolve(&doc, "a.b.c").exists());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_ttl_expiry_re_resolves() {
        let doc = doc("{\"a\": 1}");
        let cache = PathCache::new(CacheConfig::new(16, Duration::from_millis(5)));

        let first = cache.resolve(&doc, "a");
        std::thread::sleep(Duration::from_millis(20));
        let second = cache.resolve(&doc, "a");

        assert_eq!(first, second);
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_lru_eviction_at_capacity() {
        let doc = doc("{\"a\": 1, \"b\": 2, \"c\": 3}");
        let cache = PathCache::new(CacheConfig::new(2, Duration::from_secs(60)));

        cache.resolve(&doc, "a");
        cache.resolve(&doc, "b");
        cache.resolve(&doc, "c");
        assert_eq!(cache.len(), 2);

        // "a" was evicted, so resolving it again is a miss
        cache.resolve(&doc, "a");
        assert_eq!(cache.stats().misses, 4);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let doc = doc("{\"a\": 1}");
        let cache = PathCache::new(CacheConfig::new(0, Duration::from_secs(60)));
        assert_eq!(cache.resolve(&doc, "a").as_i64().unwrap(), 1);
        assert!(cache.len() <= 1);
    }

    #[test]
    fn test_documents_do_not_collide() {
        let first = doc("{\"a\": 1}");
        let second = doc("{\"a\": 2}");
        let cache = PathCache::default();

        assert_eq!(cache.resolve(&first, "a").as_i64().unwrap(), 1);
        assert_eq!(cache.resolve(&second, "a").as_i64().unwrap(), 2);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_clear() {
        let doc = doc("{\"a\": 1}");
        let cache = PathCache::default();
        cache.resolve(&doc, "a");
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_resolution() {
        let doc = doc("{\"a\": {\"b\": 7}}");
        let cache = PathCache::default();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        assert_eq!(cache.resolve(&doc, "a.b").as_i64().unwrap(), 7);
                    }
                });
            }
        });

        assert_eq!(cache.len(), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 200);
    }
}
