//! Upstream reconciliation.

mod diff;
mod reconciler;
mod source;

pub use diff::diff_character;
pub use reconciler::{CharacterReconciler, DEFAULT_MAX_FETCH, SyncOutcome};
pub(crate) use reconciler::{METRIC_SYNC_RUN_MS, METRIC_SYNC_RUNS, METRIC_SYNC_UPDATED};
pub use source::{CharacterSource, ExternalCharacter, SourceError};
