//! Field-level comparison between a stored row and its upstream counterpart.

use crate::application::repos::CharacterChanges;
use crate::domain::entities::{CharacterRecord, OriginRecord};

use super::source::ExternalCharacter;

/// Columns of `current` that disagree with `upstream`.
///
/// `origin` is the origin row resolved for the upstream origin name, or `None`
/// when upstream has no origin; both the denormalized name and the reference
/// follow it. The character name is never synced.
pub fn diff_character(
    current: &CharacterRecord,
    upstream: &ExternalCharacter,
    origin: Option<&OriginRecord>,
) -> CharacterChanges {
    let mut changes = CharacterChanges::default();

    if current.status != upstream.status {
        changes.status = Some(upstream.status.clone());
    }
    if current.species != upstream.species {
        changes.species = Some(upstream.species.clone());
    }
    if current.gender != upstream.gender {
        changes.gender = Some(upstream.gender.clone());
    }

    let desired_name = origin.map(|origin| origin.name.clone());
    let desired_id = origin.map(|origin| origin.id);
    if current.origin != desired_name {
        changes.origin = Some(desired_name);
    }
    if current.origin_id != desired_id {
        changes.origin_id = Some(desired_id);
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> CharacterRecord {
        CharacterRecord {
            id: 1,
            name: "Rick Sanchez".to_string(),
            status: Some("Alive".to_string()),
            species: Some("Human".to_string()),
            gender: Some("Male".to_string()),
            origin: Some("Earth (C-137)".to_string()),
            origin_id: Some(3),
        }
    }

    fn upstream() -> ExternalCharacter {
        ExternalCharacter {
            id: 1,
            name: "Rick Sanchez".to_string(),
            status: Some("Alive".to_string()),
            species: Some("Human".to_string()),
            gender: Some("Male".to_string()),
            origin: Some("Earth (C-137)".to_string()),
        }
    }

    fn earth() -> OriginRecord {
        OriginRecord {
            id: 3,
            name: "Earth (C-137)".to_string(),
        }
    }

    #[test]
    fn identical_rows_produce_no_changes() {
        let origin = earth();
        assert!(diff_character(&row(), &upstream(), Some(&origin)).is_empty());
    }

    #[test]
    fn only_changed_fields_are_reported() {
        let origin = earth();
        let mut remote = upstream();
        remote.status = Some("Dead".to_string());
        remote.name = "Renamed upstream".to_string();

        let changes = diff_character(&row(), &remote, Some(&origin));

        assert_eq!(
            changes,
            CharacterChanges {
                status: Some(Some("Dead".to_string())),
                ..Default::default()
            }
        );
    }

    #[test]
    fn missing_and_null_values_compare_equal() {
        let mut current = row();
        current.species = None;
        let mut remote = upstream();
        remote.species = None;

        let origin = earth();
        assert!(diff_character(&current, &remote, Some(&origin)).is_empty());
    }

    #[test]
    fn divergent_reference_is_repaired() {
        let mut current = row();
        current.origin_id = None;

        let origin = earth();
        let changes = diff_character(&current, &upstream(), Some(&origin));

        assert_eq!(changes.origin, None);
        assert_eq!(changes.origin_id, Some(Some(3)));
    }

    #[test]
    fn upstream_without_origin_clears_both_fields() {
        let mut remote = upstream();
        remote.origin = None;

        let changes = diff_character(&row(), &remote, None);

        assert_eq!(changes.origin, Some(None));
        assert_eq!(changes.origin_id, Some(None));
    }
}
