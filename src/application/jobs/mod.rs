mod sync_characters;

pub use sync_characters::{
    DEFAULT_SYNC_SCHEDULE, SyncCharactersContext, SyncCharactersJob, SyncScheduler,
    process_sync_characters_job, sync_characters_schedule,
};
