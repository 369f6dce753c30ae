//! Cache configuration.
//!
//! Selects the cache backend and the lifetime of cached query results via the
//! `[cache]` section of `citadel.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_MEMORY_CAPACITY: usize = 1024;
const DEFAULT_QUERY_TTL_SECS: u64 = 120;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis connection URL. When absent the in-process cache is used.
    pub redis_url: Option<String>,
    /// Maximum entries held by the in-process cache.
    pub memory_capacity: usize,
    /// Lifetime of a cached query result, in seconds.
    pub query_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
            query_ttl_seconds: DEFAULT_QUERY_TTL_SECS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            redis_url: settings.redis_url.clone(),
            memory_capacity: settings.memory_capacity,
            query_ttl_seconds: settings.query_ttl_seconds,
        }
    }
}

impl CacheConfig {
    /// Returns the in-process capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn query_ttl(&self) -> Duration {
        Duration::from_secs(self.query_ttl_seconds)
    }
}
