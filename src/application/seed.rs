//! First-run population of an empty character table from upstream.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::characters::CharacterRepository;
use crate::application::repos::RepoError;
use crate::application::sync::{CharacterSource, ExternalCharacter, SourceError};
use crate::domain::characters::NewCharacter;
use crate::domain::error::DomainError;

pub const DEFAULT_SEED_COUNT: usize = 15;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("upstream character {upstream_id} is invalid: {source}")]
    Invalid {
        upstream_id: i32,
        source: DomainError,
    },
    #[error("upstream ids are not contiguous: {previous} is followed by {next}")]
    Gap { previous: i32, next: i32 },
    #[error("upstream character {upstream_id} was stored under id {local_id}")]
    Misaligned { upstream_id: i32, local_id: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    AlreadySeeded { existing: u64 },
    Seeded { inserted: usize },
}

/// Insert up to `count` upstream characters when the table is empty.
///
/// Rows are inserted in upstream order so that on a fresh table local ids line
/// up with upstream ids. The whole page is validated first: an invalid entry or
/// a hole in the upstream ids aborts the seed before anything is written.
pub async fn seed_characters(
    repository: &CharacterRepository,
    source: Arc<dyn CharacterSource>,
    count: usize,
) -> Result<SeedOutcome, SeedError> {
    let existing = repository.count().await?;
    if existing > 0 {
        info!(
            target = "citadel::seed",
            existing, "Characters table already populated; skipping seed"
        );
        return Ok(SeedOutcome::AlreadySeeded { existing });
    }

    let upstream = source.fetch_characters(count).await?;
    let inputs = prepare_rows(upstream.into_iter().take(count).collect())?;

    let mut inserted = 0;
    for (upstream_id, input) in inputs {
        let record = repository.create(input).await?;
        if record.id != upstream_id {
            return Err(SeedError::Misaligned {
                upstream_id,
                local_id: record.id,
            });
        }
        inserted += 1;
    }

    info!(target = "citadel::seed", inserted, "Seeded characters");
    Ok(SeedOutcome::Seeded { inserted })
}

/// Normalize every upstream entry, keeping its id, and require consecutive ids.
fn prepare_rows(upstream: Vec<ExternalCharacter>) -> Result<Vec<(i32, NewCharacter)>, SeedError> {
    let mut rows: Vec<(i32, NewCharacter)> = Vec::with_capacity(upstream.len());
    for character in upstream {
        if let Some((previous, _)) = rows.last()
            && character.id != previous + 1
        {
            return Err(SeedError::Gap {
                previous: *previous,
                next: character.id,
            });
        }

        let upstream_id = character.id;
        let input = NewCharacter {
            name: character.name,
            status: character.status,
            species: character.species,
            gender: character.gender,
            origin: character.origin,
        }
        .normalize()
        .map_err(|source| SeedError::Invalid {
            upstream_id,
            source,
        })?;
        rows.push((upstream_id, input));
    }
    Ok(rows)
}
