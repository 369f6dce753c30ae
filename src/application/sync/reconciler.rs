//! Periodic reconciliation of stored characters against the upstream catalogue.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::application::characters::{CharacterRepository, invalidate_character_queries};
use crate::application::repos::RepoError;
use crate::cache::{CHARACTERS_PREFIX, CacheStore};

use super::diff::diff_character;
use super::source::{CharacterSource, SourceError};

const TARGET: &str = "citadel::sync::reconciler";

/// Upper bound on upstream records compared per run.
pub const DEFAULT_MAX_FETCH: u64 = 20;

pub(crate) const METRIC_SYNC_RUNS: &str = "citadel_sync_runs_total";
pub(crate) const METRIC_SYNC_UPDATED: &str = "citadel_sync_updated_total";
pub(crate) const METRIC_SYNC_RUN_MS: &str = "citadel_sync_run_ms";

#[derive(Debug, Error)]
enum SyncError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// What a single sync run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The store held no characters, so nothing was fetched.
    EmptyStore,
    /// Another run was still in progress.
    AlreadyRunning,
    Completed {
        fetched: usize,
        updated: usize,
        /// Keys removed by the post-run invalidation, when one ran and succeeded.
        invalidated: Option<u64>,
    },
    Failed {
        reason: String,
    },
}

impl SyncOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::EmptyStore => "empty_store",
            Self::AlreadyRunning => "already_running",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

pub struct CharacterReconciler {
    repository: Arc<CharacterRepository>,
    source: Arc<dyn CharacterSource>,
    cache: Arc<dyn CacheStore>,
    max_fetch: u64,
    running: Mutex<()>,
}

impl CharacterReconciler {
    pub fn new(
        repository: Arc<CharacterRepository>,
        source: Arc<dyn CharacterSource>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            repository,
            source,
            cache,
            max_fetch: DEFAULT_MAX_FETCH,
            running: Mutex::new(()),
        }
    }

    pub fn with_max_fetch(mut self, max_fetch: u64) -> Self {
        self.max_fetch = max_fetch.max(1);
        self
    }

    /// Run one reconciliation pass. Never fails; problems are logged and
    /// reported through the returned outcome.
    pub async fn run_sync(&self) -> SyncOutcome {
        let Ok(_guard) = self.running.try_lock() else {
            info!(target = TARGET, "Character sync already running; skipping");
            counter!(METRIC_SYNC_RUNS, "outcome" => "already_running").increment(1);
            return SyncOutcome::AlreadyRunning;
        };

        let started_at = Instant::now();
        let outcome = match self.reconcile().await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(target = TARGET, error = %err, "Character sync failed");
                SyncOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        histogram!(METRIC_SYNC_RUN_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        counter!(METRIC_SYNC_RUNS, "outcome" => outcome.label()).increment(1);
        outcome
    }

    async fn reconcile(&self) -> Result<SyncOutcome, SyncError> {
        let stored = self.repository.count().await?;
        if stored == 0 {
            info!(target = TARGET, "No characters stored; skipping sync");
            return Ok(SyncOutcome::EmptyStore);
        }

        let limit = stored.min(self.max_fetch) as usize;
        let latest = self.source.fetch_characters(limit).await?;
        let fetched = latest.len();

        let mut updated = 0usize;
        for upstream in latest.iter().take(limit) {
            let Some(current) = self.repository.find_by_id(upstream.id).await? else {
                continue;
            };

            let origin = self
                .repository
                .resolve_origin(upstream.origin.as_deref())
                .await?;
            let changes = diff_character(&current, upstream, origin.as_ref());
            if changes.is_empty() {
                continue;
            }

            self.repository.apply_changes(current.id, changes).await?;
            updated += 1;
        }

        counter!(METRIC_SYNC_UPDATED).increment(updated as u64);
        info!(
            target = TARGET,
            fetched, updated, "Character sync completed"
        );

        let invalidated = if updated > 0 {
            let deleted = invalidate_character_queries(self.cache.as_ref()).await;
            match deleted {
                Some(deleted) => info!(
                    target = TARGET,
                    prefix = CHARACTERS_PREFIX,
                    deleted,
                    "Cache invalidated after sync"
                ),
                None => warn!(
                    target = TARGET,
                    prefix = CHARACTERS_PREFIX,
                    "Cache invalidation after sync failed"
                ),
            }
            deleted
        } else {
            None
        };

        Ok(SyncOutcome::Completed {
            fetched,
            updated,
            invalidated,
        })
    }
}
