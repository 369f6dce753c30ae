//! Character write inputs and their field rules.

use super::error::DomainError;

pub const NAME_MAX_LEN: usize = 100;
pub const STATUS_MAX_LEN: usize = 50;
pub const SPECIES_MAX_LEN: usize = 100;
pub const GENDER_MAX_LEN: usize = 50;
pub const ORIGIN_MAX_LEN: usize = 100;

/// Three-way change for a nullable column in a partial update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldPatch<T> {
    #[default]
    Unchanged,
    Clear,
    Set(T),
}

impl<T> FieldPatch<T> {
    /// Collapse into the column value to write, or `None` when untouched.
    pub fn into_change(self) -> Option<Option<T>> {
        match self {
            Self::Unchanged => None,
            Self::Clear => Some(None),
            Self::Set(value) => Some(Some(value)),
        }
    }
}

impl FieldPatch<String> {
    /// Trim a textual patch; a blank value becomes [`FieldPatch::Clear`].
    pub fn trimmed(self) -> Self {
        match self {
            Self::Set(value) => match non_blank(Some(value)) {
                Some(value) => Self::Set(value),
                None => Self::Clear,
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewCharacter {
    pub name: String,
    pub status: Option<String>,
    pub species: Option<String>,
    pub gender: Option<String>,
    pub origin: Option<String>,
}

impl NewCharacter {
    /// Trim every field and reject inputs that break the column rules.
    pub fn normalize(self) -> Result<Self, DomainError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name must not be empty"));
        }
        check_len("name", Some(name.as_str()), NAME_MAX_LEN)?;

        let normalized = Self {
            name,
            status: non_blank(self.status),
            species: non_blank(self.species),
            gender: non_blank(self.gender),
            origin: non_blank(self.origin),
        };
        check_len("status", normalized.status.as_deref(), STATUS_MAX_LEN)?;
        check_len("species", normalized.species.as_deref(), SPECIES_MAX_LEN)?;
        check_len("gender", normalized.gender.as_deref(), GENDER_MAX_LEN)?;
        check_len("origin", normalized.origin.as_deref(), ORIGIN_MAX_LEN)?;
        Ok(normalized)
    }
}

/// Partial update. `origin` set to a blank value clears both the origin name
/// and its reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharacterUpdate {
    pub name: Option<String>,
    pub status: FieldPatch<String>,
    pub species: FieldPatch<String>,
    pub gender: FieldPatch<String>,
    pub origin: FieldPatch<String>,
}

impl CharacterUpdate {
    pub fn normalize(self) -> Result<Self, DomainError> {
        let name = match self.name {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(DomainError::validation("name must not be empty"));
                }
                check_len("name", Some(name.as_str()), NAME_MAX_LEN)?;
                Some(name)
            }
            None => None,
        };

        let normalized = Self {
            name,
            status: self.status.trimmed(),
            species: self.species.trimmed(),
            gender: self.gender.trimmed(),
            origin: self.origin.trimmed(),
        };
        check_patch_len("status", &normalized.status, STATUS_MAX_LEN)?;
        check_patch_len("species", &normalized.species, SPECIES_MAX_LEN)?;
        check_patch_len("gender", &normalized.gender, GENDER_MAX_LEN)?;
        check_patch_len("origin", &normalized.origin, ORIGIN_MAX_LEN)?;
        Ok(normalized)
    }
}

/// Trim a value, mapping blank strings to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

pub(crate) fn check_len(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), DomainError> {
    match value {
        Some(value) if value.chars().count() > max => Err(DomainError::validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

fn check_patch_len(
    field: &'static str,
    patch: &FieldPatch<String>,
    max: usize,
) -> Result<(), DomainError> {
    match patch {
        FieldPatch::Set(value) => check_len(field, Some(value.as_str()), max),
        _ => Ok(()),
    }
}
