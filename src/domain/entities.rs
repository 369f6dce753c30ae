//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};

/// Plain character row as stored and as cached.
///
/// `origin` is the denormalized origin name; `origin_id` references
/// [`OriginRecord::id`]. When `origin_id` is set the two agree, except for
/// short windows that the sync job repairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    pub id: i32,
    pub name: String,
    pub status: Option<String>,
    pub species: Option<String>,
    pub gender: Option<String>,
    pub origin: Option<String>,
    pub origin_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginRecord {
    pub id: i32,
    pub name: String,
}
