//! Citadel cache layer.
//!
//! Character query results are cached under keys derived from the query
//! filter (see [`keys`]). Two backends implement [`CacheStore`]:
//!
//! - **Redis**: shared between processes, selected by `cache.redis_url`
//! - **Memory**: a bounded LRU inside the process, used otherwise
//!
//! ```toml
//! [cache]
//! redis_url = "redis://127.0.0.1:6379"
//! memory_capacity = 1024
//! query_ttl_seconds = 120
//! ```

mod config;
pub mod keys;
mod lock;
mod redis_cache;
mod store;

use std::sync::Arc;

use tracing::{info, warn};

pub use config::CacheConfig;
pub use keys::{CHARACTERS_PREFIX, character_query_key, stable_serialize};
pub use redis_cache::RedisCache;
pub use store::{CacheError, CacheStore, MemoryCache};

/// Build the configured cache backend.
///
/// An unreachable Redis endpoint degrades to the in-process cache instead of
/// failing startup.
pub async fn build_cache_store(config: &CacheConfig) -> Arc<dyn CacheStore> {
    if let Some(url) = config.redis_url.as_deref() {
        match RedisCache::connect(url).await {
            Ok(cache) => {
                info!(target = "citadel::cache", backend = "redis", "Cache ready");
                return Arc::new(cache);
            }
            Err(err) => {
                warn!(
                    target = "citadel::cache",
                    error = %err,
                    "Redis unavailable; falling back to in-process cache"
                );
            }
        }
    }

    info!(
        target = "citadel::cache",
        backend = "memory",
        capacity = config.memory_capacity_non_zero().get(),
        "Cache ready"
    );
    Arc::new(MemoryCache::new(config.memory_capacity_non_zero()))
}
