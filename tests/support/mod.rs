//! In-memory fakes for the store, cache and upstream seams.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use citadel::application::characters::{CharacterRepository, CharacterService};
use citadel::application::repos::{
    CharacterChanges, CharacterQuery, CharacterStore, InsertCharacterParams, OriginStore,
    RepoError,
};
use citadel::application::sync::{CharacterSource, ExternalCharacter, SourceError};
use citadel::cache::{CacheError, CacheStore, MemoryCache};
use citadel::domain::entities::{CharacterRecord, OriginRecord};

pub const QUERY_TTL: Duration = Duration::from_secs(120);

pub fn character(id: i32, name: &str) -> CharacterRecord {
    CharacterRecord {
        id,
        name: name.to_string(),
        status: Some("Alive".to_string()),
        species: Some("Human".to_string()),
        gender: Some("Male".to_string()),
        origin: None,
        origin_id: None,
    }
}

pub fn external(id: i32, name: &str) -> ExternalCharacter {
    ExternalCharacter {
        id,
        name: name.to_string(),
        status: Some("Alive".to_string()),
        species: Some("Human".to_string()),
        gender: Some("Male".to_string()),
        origin: None,
    }
}

/// `ILIKE` as the fakes understand it: `%x%` is a substring match, anything
/// else an exact match, both ignoring case.
fn ilike(value: Option<&str>, pattern: &str) -> bool {
    let Some(value) = value else {
        return false;
    };
    let value = value.to_lowercase();
    let pattern = pattern.to_lowercase();
    match pattern
        .strip_prefix('%')
        .and_then(|rest| rest.strip_suffix('%'))
    {
        Some(needle) => value.contains(needle),
        None => value == pattern,
    }
}

#[derive(Default)]
pub struct FakeCharacterStore {
    rows: Mutex<BTreeMap<i32, CharacterRecord>>,
    queries: Mutex<Vec<CharacterQuery>>,
    updates: Mutex<Vec<(i32, CharacterChanges)>>,
    fail: AtomicBool,
}

impl FakeCharacterStore {
    pub fn with_rows(rows: impl IntoIterator<Item = CharacterRecord>) -> Self {
        let store = Self::default();
        {
            let mut map = store.rows.lock().unwrap();
            for row in rows {
                map.insert(row.id, row);
            }
        }
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<CharacterQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<(i32, CharacterChanges)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn row(&self, id: i32) -> Option<CharacterRecord> {
        self.rows.lock().unwrap().get(&id).cloned()
    }

    fn check(&self) -> Result<(), RepoError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("store offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl CharacterStore for FakeCharacterStore {
    async fn find_many(&self, query: &CharacterQuery) -> Result<Vec<CharacterRecord>, RepoError> {
        self.check()?;
        self.queries.lock().unwrap().push(query.clone());

        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|row| {
                query.predicates.iter().all(|predicate| {
                    let value = match predicate.column.as_str() {
                        "name" => Some(row.name.as_str()),
                        "status" => row.status.as_deref(),
                        "species" => row.species.as_deref(),
                        "gender" => row.gender.as_deref(),
                        _ => row.origin.as_deref(),
                    };
                    ilike(value, &predicate.pattern)
                })
            })
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<CharacterRecord>, RepoError> {
        self.check()?;
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn insert(&self, params: InsertCharacterParams) -> Result<CharacterRecord, RepoError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
        let record = CharacterRecord {
            id,
            name: params.name,
            status: params.status,
            species: params.species,
            gender: params.gender,
            origin: params.origin,
            origin_id: params.origin_id,
        };
        rows.insert(id, record.clone());
        Ok(record)
    }

    async fn update_by_id(
        &self,
        id: i32,
        changes: CharacterChanges,
    ) -> Result<Option<CharacterRecord>, RepoError> {
        self.check()?;
        self.updates.lock().unwrap().push((id, changes.clone()));

        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(status) = changes.status {
            row.status = status;
        }
        if let Some(species) = changes.species {
            row.species = species;
        }
        if let Some(gender) = changes.gender {
            row.gender = gender;
        }
        if let Some(origin) = changes.origin {
            row.origin = origin;
        }
        if let Some(origin_id) = changes.origin_id {
            row.origin_id = origin_id;
        }
        Ok(Some(row.clone()))
    }

    async fn delete_by_id(&self, id: i32) -> Result<bool, RepoError> {
        self.check()?;
        Ok(self.rows.lock().unwrap().remove(&id).is_some())
    }

    async fn count(&self) -> Result<u64, RepoError> {
        self.check()?;
        Ok(self.rows.lock().unwrap().len() as u64)
    }
}

#[derive(Default)]
pub struct FakeOriginStore {
    origins: Mutex<Vec<OriginRecord>>,
    lookups: AtomicUsize,
}

impl FakeOriginStore {
    pub fn with_origins(origins: impl IntoIterator<Item = OriginRecord>) -> Self {
        let store = Self::default();
        store.origins.lock().unwrap().extend(origins);
        store
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn origins(&self) -> Vec<OriginRecord> {
        self.origins.lock().unwrap().clone()
    }
}

#[async_trait]
impl OriginStore for FakeOriginStore {
    async fn find_or_create_by_name(&self, name: &str) -> Result<OriginRecord, RepoError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let mut origins = self.origins.lock().unwrap();
        if let Some(existing) = origins.iter().find(|origin| origin.name == name) {
            return Ok(existing.clone());
        }
        let record = OriginRecord {
            id: origins.iter().map(|origin| origin.id).max().unwrap_or(0) + 1,
            name: name.to_string(),
        };
        origins.push(record.clone());
        Ok(record)
    }
}

/// Memory cache that records traffic and can be told to fail.
pub struct RecordingCache {
    inner: MemoryCache,
    pub fail_get: AtomicBool,
    pub fail_set: AtomicBool,
    pub fail_delete: AtomicBool,
    gets: AtomicUsize,
    sets: Mutex<Vec<(String, Duration)>>,
    deleted_prefixes: Mutex<Vec<String>>,
}

impl Default for RecordingCache {
    fn default() -> Self {
        Self {
            inner: MemoryCache::new(NonZeroUsize::new(64).unwrap()),
            fail_get: AtomicBool::new(false),
            fail_set: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            gets: AtomicUsize::new(0),
            sets: Mutex::new(Vec::new()),
            deleted_prefixes: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingCache {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> Vec<(String, Duration)> {
        self.sets.lock().unwrap().clone()
    }

    pub fn deleted_prefixes(&self) -> Vec<String> {
        self.deleted_prefixes.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub async fn put_raw(&self, key: &str, value: &str) {
        self.inner
            .set(key, value.to_string(), QUERY_TTL)
            .await
            .unwrap();
    }
}

#[async_trait]
impl CacheStore for RecordingCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("get refused".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.sets.lock().unwrap().push((key.to_string(), ttl));
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("set refused".to_string()));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        self.deleted_prefixes.lock().unwrap().push(prefix.to_string());
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(CacheError::Command("delete refused".to_string()));
        }
        self.inner.delete_by_prefix(prefix).await
    }
}

/// Upstream catalogue returning a fixed page.
#[derive(Default)]
pub struct StaticSource {
    characters: Vec<ExternalCharacter>,
    fail: AtomicBool,
    limits: Mutex<Vec<usize>>,
    delay: Option<Duration>,
}

impl StaticSource {
    pub fn new(characters: Vec<ExternalCharacter>) -> Self {
        Self {
            characters,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        let source = Self::default();
        source.fail.store(true, Ordering::SeqCst);
        source
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn limits(&self) -> Vec<usize> {
        self.limits.lock().unwrap().clone()
    }
}

#[async_trait]
impl CharacterSource for StaticSource {
    async fn fetch_characters(&self, limit: usize) -> Result<Vec<ExternalCharacter>, SourceError> {
        self.limits.lock().unwrap().push(limit);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(SourceError::Transport("connection refused".to_string()));
        }
        Ok(self.characters.iter().take(limit).cloned().collect())
    }
}

/// Fakes wired into a repository and a service.
pub struct Harness {
    pub characters: Arc<FakeCharacterStore>,
    pub origins: Arc<FakeOriginStore>,
    pub cache: Arc<RecordingCache>,
    pub repository: Arc<CharacterRepository>,
    pub service: CharacterService,
}

impl Harness {
    pub fn new(rows: impl IntoIterator<Item = CharacterRecord>) -> Self {
        Self::with_origins(rows, Vec::new())
    }

    pub fn with_origins(
        rows: impl IntoIterator<Item = CharacterRecord>,
        origins: Vec<OriginRecord>,
    ) -> Self {
        let characters = Arc::new(FakeCharacterStore::with_rows(rows));
        let origins = Arc::new(FakeOriginStore::with_origins(origins));
        let cache = Arc::new(RecordingCache::default());
        let repository = Arc::new(CharacterRepository::new(
            characters.clone(),
            origins.clone(),
        ));
        let service = CharacterService::new(repository.clone(), cache.clone(), QUERY_TTL);
        Self {
            characters,
            origins,
            cache,
            repository,
            service,
        }
    }
}
