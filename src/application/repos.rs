//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::{CharacterRecord, OriginRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Filterable text columns of the `characters` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterColumn {
    Name,
    Status,
    Species,
    Gender,
    Origin,
}

impl CharacterColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Status => "status",
            Self::Species => "species",
            Self::Gender => "gender",
            Self::Origin => "origin",
        }
    }
}

/// Case-insensitive `column ILIKE pattern` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IlikePredicate {
    pub column: CharacterColumn,
    pub pattern: String,
}

impl IlikePredicate {
    pub fn new(column: CharacterColumn, pattern: impl Into<String>) -> Self {
        Self {
            column,
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterOrder {
    #[default]
    IdAsc,
}

/// Fully resolved listing query handed to a [`CharacterStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterQuery {
    pub predicates: Vec<IlikePredicate>,
    pub limit: u32,
    pub offset: u32,
    pub order: CharacterOrder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertCharacterParams {
    pub name: String,
    pub status: Option<String>,
    pub species: Option<String>,
    pub gender: Option<String>,
    pub origin: Option<String>,
    pub origin_id: Option<i32>,
}

/// Column changes for a single-row update; `None` leaves a column untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharacterChanges {
    pub name: Option<String>,
    pub status: Option<Option<String>>,
    pub species: Option<Option<String>>,
    pub gender: Option<Option<String>>,
    pub origin: Option<Option<String>>,
    pub origin_id: Option<Option<i32>>,
}

impl CharacterChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.species.is_none()
            && self.gender.is_none()
            && self.origin.is_none()
            && self.origin_id.is_none()
    }
}

#[async_trait]
pub trait CharacterStore: Send + Sync {
    async fn find_many(&self, query: &CharacterQuery) -> Result<Vec<CharacterRecord>, RepoError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<CharacterRecord>, RepoError>;

    async fn insert(&self, params: InsertCharacterParams) -> Result<CharacterRecord, RepoError>;

    /// Apply `changes` to one row, returning the row after the update or
    /// `None` when it does not exist.
    async fn update_by_id(
        &self,
        id: i32,
        changes: CharacterChanges,
    ) -> Result<Option<CharacterRecord>, RepoError>;

    async fn delete_by_id(&self, id: i32) -> Result<bool, RepoError>;

    async fn count(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait OriginStore: Send + Sync {
    /// Return the origin named `name`, creating it when absent.
    async fn find_or_create_by_name(&self, name: &str) -> Result<OriginRecord, RepoError>;
}
