//! Cache storage seam and the in-process implementation.

use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache command failed: {0}")]
    Command(String),
}

/// Key/value cache with per-entry expiry and prefix invalidation.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a raw value; expired or missing entries yield `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove every key starting with `prefix`, returning how many were removed.
    /// An empty prefix removes nothing.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError>;
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// Bounded LRU cache used when no Redis endpoint is configured.
pub struct MemoryCache {
    entries: RwLock<LruCache<String, MemoryEntry>>,
}

impl MemoryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        // LRU reads reorder entries, so a read also takes the write lock.
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let entry = MemoryEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        rw_write(&self.entries, SOURCE, "set").put(key.to_string(), entry);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        if prefix.is_empty() {
            return Ok(0);
        }

        let mut entries = rw_write(&self.entries, SOURCE, "delete_by_prefix");
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        Ok(doomed.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(capacity: usize) -> MemoryCache {
        MemoryCache::new(NonZeroUsize::new(capacity).unwrap())
    }

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let cache = cache(4);
        cache
            .set("characters:{}", "[]".to_string(), Duration::from_secs(120))
            .await
            .unwrap();

        assert_eq!(
            cache.get("characters:{}").await.unwrap().as_deref(),
            Some("[]")
        );
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = cache(4);
        cache
            .set("characters:{}", "[]".to_string(), Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(cache.get("characters:{}").await.unwrap(), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn delete_by_prefix_only_touches_matching_keys() {
        let cache = cache(8);
        let ttl = Duration::from_secs(60);
        cache.set("characters:a", "1".into(), ttl).await.unwrap();
        cache.set("characters:b", "2".into(), ttl).await.unwrap();
        cache.set("origins:a", "3".into(), ttl).await.unwrap();

        assert_eq!(cache.delete_by_prefix("characters:").await.unwrap(), 2);
        assert_eq!(cache.get("characters:a").await.unwrap(), None);
        assert_eq!(cache.get("origins:a").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn empty_prefix_deletes_nothing() {
        let cache = cache(4);
        cache
            .set("characters:a", "1".into(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.delete_by_prefix("").await.unwrap(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let cache = cache(2);
        let ttl = Duration::from_secs(60);
        cache.set("a", "1".into(), ttl).await.unwrap();
        cache.set("b", "2".into(), ttl).await.unwrap();
        cache.get("a").await.unwrap();
        cache.set("c", "3".into(), ttl).await.unwrap();

        assert_eq!(cache.get("b").await.unwrap(), None);
        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some("1"));
    }
}
