//! Challenge aggregate root.
//!
//! A challenge is the multi-day program a user works through. It owns its
//! sections, day records and measurements; every other entity reaches its
//! owner through the challenge.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntityName, UserId};

/// Lifecycle state of a challenge.
///
/// # Examples
/// ```
/// use hardinfinity::domain::ChallengeStatus;
///
/// assert_eq!("active".parse::<ChallengeStatus>(), Ok(ChallengeStatus::Active));
/// assert_eq!(ChallengeStatus::Failed.as_str(), "failed");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    /// Entries can be recorded.
    #[default]
    Active,
    Completed,
    Failed,
}

impl ChallengeStatus {
    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether day records may be written.
    pub fn accepts_entries(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown challenge status: {input}")]
pub struct ParseChallengeStatusError {
    /// The unrecognised input value.
    pub input: String,
}

impl FromStr for ChallengeStatus {
    type Err = ParseChallengeStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseChallengeStatusError {
                input: s.to_owned(),
            }),
        }
    }
}

/// Validation errors raised by challenge constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeValidationError {
    #[error("end date must not precede the start date")]
    EndsBeforeStart,
    #[error("current day must be at least 1")]
    CurrentDayNotPositive,
}

/// Persisted challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: Uuid,
    pub owner: UserId,
    pub name: EntityName,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    /// 1-based day the owner is currently working on.
    pub current_day: u32,
    pub status: ChallengeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Challenge {
    /// Whether `user` owns this challenge.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }
}

/// Input for creating a challenge.
///
/// New challenges always start on day 1 with [`ChallengeStatus::Active`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeDraft {
    pub id: Uuid,
    pub owner: UserId,
    pub name: EntityName,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl ChallengeDraft {
    /// Validate the date range of a new challenge.
    pub fn new(
        id: Uuid,
        owner: UserId,
        name: EntityName,
        description: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Self, ChallengeValidationError> {
        validate_dates(start_date, end_date)?;
        Ok(Self {
            id,
            owner,
            name,
            description: description.into(),
            start_date,
            end_date,
        })
    }
}

/// Full replacement of a challenge's editable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeChanges {
    pub name: EntityName,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub current_day: u32,
    pub status: ChallengeStatus,
}

impl ChallengeChanges {
    /// Validate an update request.
    pub fn new(
        name: EntityName,
        description: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: Option<DateTime<Utc>>,
        current_day: u32,
        status: ChallengeStatus,
    ) -> Result<Self, ChallengeValidationError> {
        validate_dates(start_date, end_date)?;
        if current_day == 0 {
            return Err(ChallengeValidationError::CurrentDayNotPositive);
        }
        Ok(Self {
            name,
            description: description.into(),
            start_date,
            end_date,
            current_day,
            status,
        })
    }
}

fn validate_dates(
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
) -> Result<(), ChallengeValidationError> {
    if end_date.is_some_and(|end| end < start_date) {
        return Err(ChallengeValidationError::EndsBeforeStart);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, d, 0, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn name() -> EntityName {
        EntityName::new("75 Hard").expect("valid name")
    }

    #[rstest]
    #[case::active("active", ChallengeStatus::Active)]
    #[case::completed("completed", ChallengeStatus::Completed)]
    #[case::failed("failed", ChallengeStatus::Failed)]
    fn status_round_trips_through_strings(#[case] raw: &str, #[case] status: ChallengeStatus) {
        assert_eq!(raw.parse::<ChallengeStatus>(), Ok(status));
        assert_eq!(status.to_string(), raw);
    }

    #[rstest]
    fn unknown_status_is_rejected() {
        let err = "paused".parse::<ChallengeStatus>().expect_err("unknown status");
        assert_eq!(err.input, "paused");
    }

    #[rstest]
    #[case(ChallengeStatus::Active, true)]
    #[case(ChallengeStatus::Completed, false)]
    #[case(ChallengeStatus::Failed, false)]
    fn only_active_challenges_accept_entries(#[case] status: ChallengeStatus, #[case] expected: bool) {
        assert_eq!(status.accepts_entries(), expected);
    }

    #[rstest]
    fn draft_rejects_inverted_dates() {
        let result = ChallengeDraft::new(
            Uuid::new_v4(),
            UserId::random(),
            name(),
            "",
            day(10),
            Some(day(2)),
        );
        assert_eq!(result, Err(ChallengeValidationError::EndsBeforeStart));
    }

    #[rstest]
    fn draft_accepts_open_ended_challenges() {
        let draft = ChallengeDraft::new(
            Uuid::new_v4(),
            UserId::random(),
            name(),
            "daily habits",
            day(1),
            None,
        )
        .expect("valid draft");
        assert_eq!(draft.description, "daily habits");
    }

    #[rstest]
    fn changes_require_positive_current_day() {
        let result = ChallengeChanges::new(
            name(),
            "",
            day(1),
            None,
            0,
            ChallengeStatus::Active,
        );
        assert_eq!(result, Err(ChallengeValidationError::CurrentDayNotPositive));
    }
}
