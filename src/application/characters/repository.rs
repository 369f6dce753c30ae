//! Character persistence policy on top of the store traits.
//!
//! This is the only place that turns filters into store queries and the only
//! place that resolves origin names into `origins` rows.

use std::sync::Arc;

use tracing::debug;

use crate::application::repos::{
    CharacterChanges, CharacterColumn, CharacterOrder, CharacterQuery, CharacterStore,
    IlikePredicate, InsertCharacterParams, OriginStore, RepoError,
};
use crate::domain::characters::{CharacterUpdate, FieldPatch, NewCharacter};
use crate::domain::entities::{CharacterRecord, OriginRecord};

use super::filter::{CharacterFilter, REPOSITORY_DEFAULT_LIMIT};

#[derive(Clone)]
pub struct CharacterRepository {
    characters: Arc<dyn CharacterStore>,
    origins: Arc<dyn OriginStore>,
}

impl CharacterRepository {
    pub fn new(characters: Arc<dyn CharacterStore>, origins: Arc<dyn OriginStore>) -> Self {
        Self {
            characters,
            origins,
        }
    }

    /// Translate a filter into a store query.
    ///
    /// Text predicates match as substrings; `gender` matches the trimmed value
    /// exactly, ignoring case.
    pub fn build_query(filter: &CharacterFilter) -> CharacterQuery {
        let mut predicates = Vec::new();

        let contains = [
            (CharacterColumn::Name, filter.name.as_deref()),
            (CharacterColumn::Status, filter.status.as_deref()),
            (CharacterColumn::Species, filter.species.as_deref()),
        ];
        for (column, value) in contains {
            if let Some(value) = value.filter(|value| !value.is_empty()) {
                predicates.push(IlikePredicate::new(column, format!("%{value}%")));
            }
        }

        if let Some(gender) = filter
            .gender
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            predicates.push(IlikePredicate::new(CharacterColumn::Gender, gender));
        }

        if let Some(origin) = filter.origin.as_deref().filter(|value| !value.is_empty()) {
            predicates.push(IlikePredicate::new(
                CharacterColumn::Origin,
                format!("%{origin}%"),
            ));
        }

        CharacterQuery {
            predicates,
            limit: filter.limit.unwrap_or(REPOSITORY_DEFAULT_LIMIT),
            offset: filter.offset.unwrap_or(0),
            order: CharacterOrder::IdAsc,
        }
    }

    pub async fn find_by_filter(
        &self,
        filter: &CharacterFilter,
    ) -> Result<Vec<CharacterRecord>, RepoError> {
        let query = Self::build_query(filter);
        self.characters.find_many(&query).await
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<CharacterRecord>, RepoError> {
        self.characters.find_by_id(id).await
    }

    pub async fn count(&self) -> Result<u64, RepoError> {
        self.characters.count().await
    }

    /// Find or create the origin named `name`.
    ///
    /// Blank or absent names resolve to `None` without touching the store.
    pub async fn resolve_origin(
        &self,
        name: Option<&str>,
    ) -> Result<Option<OriginRecord>, RepoError> {
        let Some(name) = name.map(str::trim).filter(|name| !name.is_empty()) else {
            return Ok(None);
        };

        let origin = self.origins.find_or_create_by_name(name).await?;
        debug!(
            target = "citadel::characters::repository",
            origin_id = origin.id,
            origin = %origin.name,
            "Resolved origin"
        );
        Ok(Some(origin))
    }

    pub async fn create(&self, input: NewCharacter) -> Result<CharacterRecord, RepoError> {
        let origin = self.resolve_origin(input.origin.as_deref()).await?;
        let (origin, origin_id) = split_origin(origin);

        self.characters
            .insert(InsertCharacterParams {
                name: input.name,
                status: input.status,
                species: input.species,
                gender: input.gender,
                origin,
                origin_id,
            })
            .await
    }

    /// Apply a partial update. Returns `None` when no row has `id`.
    pub async fn update_by_id(
        &self,
        id: i32,
        update: CharacterUpdate,
    ) -> Result<Option<CharacterRecord>, RepoError> {
        let mut changes = CharacterChanges {
            name: update.name,
            status: update.status.into_change(),
            species: update.species.into_change(),
            gender: update.gender.into_change(),
            ..Default::default()
        };

        let origin = match update.origin {
            FieldPatch::Unchanged => None,
            FieldPatch::Clear => Some(None),
            FieldPatch::Set(name) => Some(self.resolve_origin(Some(name.as_str())).await?),
        };
        if let Some(origin) = origin {
            let (origin_name, origin_id) = split_origin(origin);
            changes.origin = Some(origin_name);
            changes.origin_id = Some(origin_id);
        }

        self.characters.update_by_id(id, changes).await
    }

    /// Write precomputed column changes, as produced by the sync job.
    pub async fn apply_changes(
        &self,
        id: i32,
        changes: CharacterChanges,
    ) -> Result<Option<CharacterRecord>, RepoError> {
        self.characters.update_by_id(id, changes).await
    }

    pub async fn delete_by_id(&self, id: i32) -> Result<bool, RepoError> {
        self.characters.delete_by_id(id).await
    }
}

/// Denormalized origin name and reference for a resolved origin.
pub fn split_origin(origin: Option<OriginRecord>) -> (Option<String>, Option<i32>) {
    match origin {
        Some(origin) => (Some(origin.name), Some(origin.id)),
        None => (None, None),
    }
}
