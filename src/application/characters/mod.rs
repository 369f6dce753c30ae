//! Character queries and mutations.

mod filter;
mod repository;
mod service;

pub use filter::{API_DEFAULT_LIMIT, CharacterFilter, MAX_LIMIT, REPOSITORY_DEFAULT_LIMIT};
pub use repository::{CharacterRepository, split_origin};
pub use service::{CharacterService, invalidate_character_queries};
pub(crate) use service::{
    METRIC_CACHE_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATIONS, METRIC_CACHE_MISS,
};
