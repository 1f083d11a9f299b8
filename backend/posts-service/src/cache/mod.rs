//! Page cache
//!
//! Process-local response cache for rendered pages, keyed by request path
//! plus query string. Entries expire after a fixed TTL and the whole cache is
//! dropped whenever content changes, so readers never see a stale feed for
//! longer than one TTL after a write made elsewhere.

use crate::metrics::PAGE_CACHE_EVENTS;
use bytes::Bytes;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedPage {
    body: Bytes,
    expires_at: Instant,
}

impl CachedPage {
    #[inline]
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

pub struct PageCache {
    entries: DashMap<String, CachedPage>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        debug!(ttl_secs = ttl.as_secs(), "Initializing page cache");
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// A zero TTL turns the cache off.
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Cache key for a request: path plus query string, if any.
    pub fn key(path: &str, query: &str) -> String {
        if query.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, query)
        }
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        if !self.is_enabled() {
            return None;
        }

        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                PAGE_CACHE_EVENTS.with_label_values(&["hit"]).inc();
                debug!(key, "page cache hit");
                return Some(entry.body.clone());
            }
        }

        // Expired entries are dropped lazily on the next lookup
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        PAGE_CACHE_EVENTS.with_label_values(&["miss"]).inc();
        None
    }

    pub fn put(&self, key: impl Into<String>, body: Bytes) {
        if !self.is_enabled() {
            return;
        }
        self.entries.insert(
            key.into(),
            CachedPage {
                body,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop every cached page.
    pub fn invalidate_all(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        PAGE_CACHE_EVENTS.with_label_values(&["invalidate"]).inc();
        debug!(dropped, "page cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_then_get() {
        let cache = PageCache::new(Duration::from_secs(20));
        cache.put("/", Bytes::from_static(b"{\"page\":1}"));
        assert_eq!(cache.get("/").unwrap(), Bytes::from_static(b"{\"page\":1}"));
        assert!(cache.get("/?page=2").is_none());
    }

    #[test]
    fn test_expired_entries_are_misses() {
        let cache = PageCache::new(Duration::from_millis(10));
        cache.put("/", Bytes::from_static(b"old"));
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("/").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_all_clears() {
        let cache = PageCache::new(Duration::from_secs(20));
        cache.put("/", Bytes::from_static(b"a"));
        cache.put("/?page=2", Bytes::from_static(b"b"));
        assert_eq!(cache.len(), 2);

        cache.invalidate_all();
        assert!(cache.is_empty());
        assert!(cache.get("/").is_none());
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache = PageCache::new(Duration::ZERO);
        cache.put("/", Bytes::from_static(b"a"));
        assert!(cache.get("/").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_includes_query() {
        assert_eq!(PageCache::key("/", ""), "/");
        assert_eq!(PageCache::key("/", "page=2"), "/?page=2");
    }
}
