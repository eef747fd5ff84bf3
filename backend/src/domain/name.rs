//! Display names shared by challenges, sections and tasks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum accepted length of an entity name, in characters.
pub const ENTITY_NAME_MAX: usize = 200;

/// Validation errors returned by [`EntityName::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameValidationError {
    #[error("name must not be empty")]
    Empty,
    #[error("name must be at most {max} characters")]
    TooLong { max: usize },
}

/// A trimmed, non-empty display name.
///
/// # Examples
/// ```
/// use hardinfinity::domain::EntityName;
///
/// let name = EntityName::new("  Morning routine ").expect("valid name");
/// assert_eq!(name.as_ref(), "Morning routine");
/// assert!(EntityName::new("   ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityName(String);

impl EntityName {
    /// Trim and validate a raw name.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, NameValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(NameValidationError::Empty);
        }
        if trimmed.chars().count() > ENTITY_NAME_MAX {
            return Err(NameValidationError::TooLong {
                max: ENTITY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for EntityName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EntityName> for String {
    fn from(value: EntityName) -> Self {
        value.0
    }
}

impl TryFrom<String> for EntityName {
    type Error = NameValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
