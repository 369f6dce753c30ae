use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, warn};

use crate::application::repos::RepoError;
use crate::cache::{CHARACTERS_PREFIX, CacheStore, character_query_key};
use crate::domain::characters::{CharacterUpdate, NewCharacter};
use crate::domain::entities::CharacterRecord;

use super::filter::CharacterFilter;
use super::repository::CharacterRepository;

const TARGET: &str = "citadel::characters::service";

pub(crate) const METRIC_CACHE_HIT: &str = "citadel_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "citadel_cache_miss_total";
pub(crate) const METRIC_CACHE_ERROR: &str = "citadel_cache_error_total";
pub(crate) const METRIC_CACHE_INVALIDATIONS: &str = "citadel_cache_invalidations_total";

/// Cache-aside reads and write-then-invalidate mutations over characters.
#[derive(Clone)]
pub struct CharacterService {
    repository: Arc<CharacterRepository>,
    cache: Arc<dyn CacheStore>,
    query_ttl: Duration,
}

impl CharacterService {
    pub fn new(
        repository: Arc<CharacterRepository>,
        cache: Arc<dyn CacheStore>,
        query_ttl: Duration,
    ) -> Self {
        Self {
            repository,
            cache,
            query_ttl,
        }
    }

    /// List characters matching `filter`, serving repeated queries from cache.
    pub async fn search(&self, filter: &CharacterFilter) -> Result<Vec<CharacterRecord>, RepoError> {
        let key = match character_query_key(filter) {
            Ok(key) => Some(key),
            Err(err) => {
                warn!(target = TARGET, error = %err, "Failed to derive cache key; bypassing cache");
                None
            }
        };

        if let Some(key) = key.as_deref()
            && let Some(records) = self.cached(key).await
        {
            counter!(METRIC_CACHE_HIT).increment(1);
            debug!(target = TARGET, key, count = records.len(), "Cache hit");
            return Ok(records);
        }

        counter!(METRIC_CACHE_MISS).increment(1);
        let records = self.repository.find_by_filter(filter).await?;

        if let Some(key) = key {
            self.store(&key, &records).await;
        }
        Ok(records)
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<CharacterRecord>, RepoError> {
        self.repository.find_by_id(id).await
    }

    pub async fn create(&self, input: NewCharacter) -> Result<CharacterRecord, RepoError> {
        let record = self.repository.create(input).await?;
        invalidate_character_queries(self.cache.as_ref()).await;
        Ok(record)
    }

    /// Partially update a character. Returns `None` when it does not exist.
    pub async fn update(
        &self,
        id: i32,
        input: CharacterUpdate,
    ) -> Result<Option<CharacterRecord>, RepoError> {
        let updated = self.repository.update_by_id(id, input).await?;
        if updated.is_some() {
            invalidate_character_queries(self.cache.as_ref()).await;
        }
        Ok(updated)
    }

    pub async fn remove(&self, id: i32) -> Result<bool, RepoError> {
        let removed = self.repository.delete_by_id(id).await?;
        if removed {
            invalidate_character_queries(self.cache.as_ref()).await;
        }
        Ok(removed)
    }

    async fn cached(&self, key: &str) -> Option<Vec<CharacterRecord>> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                counter!(METRIC_CACHE_ERROR, "op" => "get").increment(1);
                warn!(target = TARGET, key, error = %err, "Cache read failed; treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => Some(records),
            Err(err) => {
                counter!(METRIC_CACHE_ERROR, "op" => "decode").increment(1);
                warn!(target = TARGET, key, error = %err, "Cached payload unreadable; treating as miss");
                None
            }
        }
    }

    async fn store(&self, key: &str, records: &[CharacterRecord]) {
        let payload = match serde_json::to_string(records) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(target = TARGET, key, error = %err, "Failed to encode query result");
                return;
            }
        };

        if let Err(err) = self.cache.set(key, payload, self.query_ttl).await {
            counter!(METRIC_CACHE_ERROR, "op" => "set").increment(1);
            warn!(target = TARGET, key, error = %err, "Cache write failed");
        }
    }
}

/// Drop every cached character query. Failures are logged, never returned.
pub async fn invalidate_character_queries(cache: &dyn CacheStore) -> Option<u64> {
    match cache.delete_by_prefix(CHARACTERS_PREFIX).await {
        Ok(deleted) => {
            counter!(METRIC_CACHE_INVALIDATIONS).increment(1);
            debug!(
                target = TARGET,
                prefix = CHARACTERS_PREFIX,
                deleted,
                "Invalidated cached character queries"
            );
            Some(deleted)
        }
        Err(err) => {
            counter!(METRIC_CACHE_ERROR, "op" => "invalidate").increment(1);
            warn!(
                target = TARGET,
                prefix = CHARACTERS_PREFIX,
                error = %err,
                "Cache invalidation failed"
            );
            None
        }
    }
}
