//! Query filter for character listings.

use serde::{Deserialize, Serialize};

use crate::domain::characters::{
    GENDER_MAX_LEN, NAME_MAX_LEN, ORIGIN_MAX_LEN, SPECIES_MAX_LEN, STATUS_MAX_LEN, check_len,
    non_blank,
};
use crate::domain::error::DomainError;

/// Page size applied by the GraphQL boundary when a request names none.
pub const API_DEFAULT_LIMIT: u32 = 20;
/// Page size applied by the repository when a filter names none.
pub const REPOSITORY_DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 100;

/// Optional predicates plus paging.
///
/// Absent fields are skipped when serialized, so two filters that differ only
/// in which fields were left out produce the same cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl CharacterFilter {
    /// Trim predicates, drop blank ones, and enforce the public bounds.
    pub fn normalize(self) -> Result<Self, DomainError> {
        let filter = Self {
            name: non_blank(self.name),
            status: non_blank(self.status),
            species: non_blank(self.species),
            gender: non_blank(self.gender),
            origin: non_blank(self.origin),
            limit: self.limit,
            offset: self.offset,
        };

        check_len("name", filter.name.as_deref(), NAME_MAX_LEN)?;
        check_len("status", filter.status.as_deref(), STATUS_MAX_LEN)?;
        check_len("species", filter.species.as_deref(), SPECIES_MAX_LEN)?;
        check_len("gender", filter.gender.as_deref(), GENDER_MAX_LEN)?;
        check_len("origin", filter.origin.as_deref(), ORIGIN_MAX_LEN)?;

        if let Some(limit) = filter.limit
            && !(1..=MAX_LIMIT).contains(&limit)
        {
            return Err(DomainError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }

        Ok(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_not_serialized() {
        let filter = CharacterFilter {
            name: Some("Rick".to_string()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&filter).unwrap(),
            r#"{"name":"Rick"}"#
        );
    }

    #[test]
    fn normalize_trims_and_drops_blank_predicates() {
        let filter = CharacterFilter {
            name: Some("  Rick ".to_string()),
            species: Some("   ".to_string()),
            limit: Some(10),
            ..Default::default()
        }
        .normalize()
        .expect("valid filter");

        assert_eq!(filter.name.as_deref(), Some("Rick"));
        assert_eq!(filter.species, None);
        assert_eq!(filter.limit, Some(10));
    }

    #[test]
    fn limit_outside_bounds_is_rejected() {
        for limit in [0, MAX_LIMIT + 1] {
            let result = CharacterFilter {
                limit: Some(limit),
                ..Default::default()
            }
            .normalize();
            assert!(result.is_err(), "limit {limit} should be rejected");
        }
    }

    #[test]
    fn overlong_status_is_rejected() {
        let result = CharacterFilter {
            status: Some("a".repeat(STATUS_MAX_LEN + 1)),
            ..Default::default()
        }
        .normalize();
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }
}
