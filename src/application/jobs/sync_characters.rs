//! Cron job that reconciles stored characters with the upstream catalogue.

use std::str::FromStr;
use std::sync::Arc;

use apalis::prelude::*;
use apalis_cron::{CronStream, Schedule};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::sync::{CharacterReconciler, SyncOutcome};

/// Twice a day, at midnight and noon.
pub const DEFAULT_SYNC_SCHEDULE: &str = "0 0 */12 * * *";

/// Marker struct for the cron-triggered sync job.
#[derive(Default, Debug, Clone)]
pub struct SyncCharactersJob;

impl From<chrono::DateTime<chrono::Utc>> for SyncCharactersJob {
    fn from(_: chrono::DateTime<chrono::Utc>) -> Self {
        Self
    }
}

#[derive(Clone)]
pub struct SyncCharactersContext {
    pub reconciler: Arc<CharacterReconciler>,
}

pub async fn process_sync_characters_job(
    _job: SyncCharactersJob,
    ctx: Data<SyncCharactersContext>,
) -> Result<(), apalis::prelude::Error> {
    match ctx.reconciler.run_sync().await {
        SyncOutcome::Completed { updated, .. } if updated > 0 => {
            info!(
                target = "citadel::jobs::sync_characters",
                updated, "Scheduled character sync updated rows"
            );
        }
        SyncOutcome::Failed { reason } => {
            warn!(
                target = "citadel::jobs::sync_characters",
                reason = %reason,
                "Scheduled character sync failed"
            );
        }
        _ => {}
    }
    Ok(())
}

/// Parse a six-field cron expression (seconds first).
pub fn sync_characters_schedule(expression: &str) -> Result<Schedule, String> {
    Schedule::from_str(expression).map_err(|err| err.to_string())
}

/// Owns the cron worker that drives the reconciler.
///
/// Started at process startup and stopped on shutdown; [`SyncScheduler::run_now`]
/// triggers a pass outside the schedule.
pub struct SyncScheduler {
    reconciler: Arc<CharacterReconciler>,
    handle: Option<JoinHandle<()>>,
}

impl SyncScheduler {
    pub fn new(reconciler: Arc<CharacterReconciler>) -> Self {
        Self {
            reconciler,
            handle: None,
        }
    }

    /// Register the cron worker and start its monitor in the background.
    pub fn start(&mut self, schedule: Schedule) {
        if self.handle.is_some() {
            return;
        }

        let ctx = SyncCharactersContext {
            reconciler: self.reconciler.clone(),
        };
        let worker = WorkerBuilder::new("sync-characters-worker")
            .data(ctx)
            .backend(CronStream::new(schedule))
            .build_fn(process_sync_characters_job);
        let monitor = Monitor::new().register(worker);

        info!(target = "citadel::jobs::sync_characters", "Character sync scheduled");
        self.handle = Some(tokio::spawn(async move {
            if let Err(err) = monitor.run().await {
                error!(error = %err, "sync monitor stopped");
            }
        }));
    }

    pub async fn run_now(&self) -> SyncOutcome {
        self.reconciler.run_sync().await
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the cron worker. A pass already in flight is abandoned.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
            info!(target = "citadel::jobs::sync_characters", "Character sync stopped");
        }
    }
}
