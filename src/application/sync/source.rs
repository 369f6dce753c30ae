use async_trait::async_trait;
use thiserror::Error;

/// A character as published by the upstream catalogue.
///
/// `id` is the upstream identifier, which doubles as the local primary key of
/// the row it was seeded into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCharacter {
    pub id: i32,
    pub name: String,
    pub status: Option<String>,
    pub species: Option<String>,
    pub gender: Option<String>,
    pub origin: Option<String>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream responded with status {0}")]
    Status(u16),
    #[error("upstream reported errors: {0}")]
    Upstream(String),
    #[error("malformed upstream payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait CharacterSource: Send + Sync {
    /// Fetch the first upstream page, truncated to at most `limit` entries.
    async fn fetch_characters(&self, limit: usize) -> Result<Vec<ExternalCharacter>, SourceError>;
}
