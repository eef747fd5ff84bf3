//! Caller identity.
//!
//! Identity providers issue opaque subject identifiers. The domain never
//! interprets them beyond equality, so [`UserId`] only guarantees the value is
//! non-empty and free of surrounding whitespace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum accepted length of an identity subject.
pub const USER_ID_MAX: usize = 255;

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must not contain surrounding whitespace")]
    PaddedId,
    #[error("user id must be at most {max} characters")]
    IdTooLong { max: usize },
}

/// Stable, opaque identifier of the authenticated caller.
///
/// # Examples
/// ```
/// use hardinfinity::domain::UserId;
///
/// let id = UserId::new("user_2abc").expect("valid id");
/// assert_eq!(id.as_ref(), "user_2abc");
/// assert!(UserId::new(" ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::PaddedId);
        }
        if id.chars().count() > USER_ID_MAX {
            return Err(UserValidationError::IdTooLong { max: USER_ID_MAX });
        }
        Ok(Self(id))
    }

    /// Generate a random identifier, mainly useful for fixtures.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
