//! Day ledger: one record per challenge day with nested task records.
//!
//! Records are keyed by `(challenge_id, day_number)` and written with upsert
//! semantics. Storage adapters drive an upsert in three steps inside one
//! transaction:
//!
//! 1. [`resolve_day`] checks the challenge accepts entries and picks the day;
//! 2. [`plan_day_upsert`] validates the nested task records against the
//!    challenge's tasks and decides whether `current_day` advances;
//! 3. the adapter writes the record, its task records and the advancement.
//!
//! `current_day` advances by exactly one when a completed record is written
//! for the current day and no record existed for that day beforehand.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Challenge, ChallengeStatus, TaskType};

/// Highest accepted energy or mood rating.
pub const RATING_MAX: u8 = 10;

/// Validation failure for [`Rating`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating must be between 0 and {RATING_MAX}, got {value}")]
pub struct RatingError {
    pub value: i64,
}

/// A self-reported energy or mood level in `0..=10`.
///
/// # Examples
/// ```
/// use hardinfinity::domain::Rating;
///
/// assert_eq!(Rating::new(7).map(Rating::get), Ok(7));
/// assert!(Rating::new(11).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Result<Self, RatingError> {
        u8::try_from(value)
            .ok()
            .filter(|rating| *rating <= RATING_MAX)
            .map(Self)
            .ok_or(RatingError { value })
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// Value recorded for one task on one day. Its variant matches the task's
/// [`TaskType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl TaskValue {
    /// Interpret a raw JSON value for a task of type `expected`.
    ///
    /// Returns `None` when the JSON shape does not fit the task type.
    ///
    /// # Examples
    /// ```
    /// use hardinfinity::domain::{TaskType, TaskValue};
    /// use serde_json::json;
    ///
    /// assert_eq!(
    ///     TaskValue::from_json(&json!(2.5), TaskType::Number),
    ///     Some(TaskValue::Number(2.5))
    /// );
    /// assert_eq!(TaskValue::from_json(&json!("yes"), TaskType::Boolean), None);
    /// ```
    pub fn from_json(raw: &serde_json::Value, expected: TaskType) -> Option<Self> {
        match expected {
            TaskType::Boolean => raw.as_bool().map(Self::Boolean),
            TaskType::Number => raw.as_f64().filter(|n| n.is_finite()).map(Self::Number),
            TaskType::Text => raw.as_str().map(|text| Self::Text(text.to_owned())),
        }
    }

    /// The task type this value belongs to.
    pub fn task_type(&self) -> TaskType {
        match self {
            Self::Boolean(_) => TaskType::Boolean,
            Self::Number(_) => TaskType::Number,
            Self::Text(_) => TaskType::Text,
        }
    }
}

/// Persisted record of one challenge day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub id: Uuid,
    pub challenge_id: Uuid,
    /// Natural key together with `challenge_id`.
    pub day_number: u32,
    /// Time of the first write for this day.
    pub date: DateTime<Utc>,
    pub completed: bool,
    pub notes: String,
    pub progress_photo_url: Option<String>,
    /// Self-reported energy.
    pub energy_level: Option<Rating>,
    /// Self-reported mood.
    pub mood_level: Option<Rating>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted outcome of one task within a day record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: Uuid,
    /// Natural key together with `task_id`.
    pub day_record_id: Uuid,
    pub task_id: Uuid,
    pub completed: bool,
    /// Typed to match the task's [`TaskType`].
    pub value: Option<TaskValue>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A day record together with its task records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    #[serde(flatten)]
    pub record: DayRecord,
    pub task_records: Vec<TaskRecord>,
}

/// Task outcome as submitted by a caller, before type checking.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecordSubmission {
    /// Must name a task of the same challenge.
    pub task_id: Uuid,
    pub completed: bool,
    /// Raw JSON, checked against the task type by [`plan_day_upsert`].
    pub value: Option<serde_json::Value>,
    pub notes: String,
}

/// Day payload as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DaySubmission {
    /// Advances the challenge when this is the first record of the current day.
    pub completed: bool,
    pub notes: String,
    pub progress_photo_url: Option<String>,
    pub energy_level: Option<Rating>,
    pub mood_level: Option<Rating>,
    /// Upserted by task id; tasks not listed keep their records.
    pub task_records: Vec<TaskRecordSubmission>,
}

/// Which day an upsert writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayTarget {
    /// The challenge's `current_day`.
    Current,
    /// An explicit day in `1..=current_day`.
    Day(u32),
}

/// Reasons a ledger write is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerRejection {
    /// The challenge is completed or failed.
    #[error("challenge is {status}; entries can only be recorded while active")]
    ChallengeNotActive { status: ChallengeStatus },
    /// An explicit day lies outside `1..=current_day`.
    #[error("day {day} is outside 1..={current_day}")]
    DayOutOfRange { day: u32, current_day: u32 },
    /// A task record names a task of another challenge, or none at all.
    #[error("task {task_id} does not belong to this challenge")]
    UnknownTask { task_id: Uuid },
    /// The same task appears twice in one submission.
    #[error("task {task_id} appears more than once")]
    DuplicateTask { task_id: Uuid },
    /// The value does not fit the task's type.
    #[error("value for task {task_id} must be a {expected}")]
    ValueMismatch { task_id: Uuid, expected: TaskType },
}

/// Task record that passed validation and is ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTaskRecord {
    pub task_id: Uuid,
    pub completed: bool,
    /// Already converted to the task's type.
    pub value: Option<TaskValue>,
    pub notes: String,
}

/// What an adapter must write for one upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct DayUpsertPlan {
    /// Day resolved by [`resolve_day`].
    pub day_number: u32,
    /// Records to insert or update, keyed by task id.
    pub task_records: Vec<ValidatedTaskRecord>,
    /// New `current_day`, when the write advances the challenge.
    pub advance_to: Option<u32>,
}

/// Result of a successful upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct DayUpsertOutcome {
    /// The stored day with all of its task records.
    pub entry: DayEntry,
    /// Whether the day record was inserted rather than updated.
    pub created: bool,
    /// The challenge's new `current_day`, when this write advanced it.
    pub advanced_to: Option<u32>,
}

/// Pick the day an upsert targets, refusing inactive challenges.
pub fn resolve_day(challenge: &Challenge, target: DayTarget) -> Result<u32, LedgerRejection> {
    if !challenge.status.accepts_entries() {
        return Err(LedgerRejection::ChallengeNotActive {
            status: challenge.status,
        });
    }
    match target {
        DayTarget::Current => Ok(challenge.current_day),
        DayTarget::Day(day) if (1..=challenge.current_day).contains(&day) => Ok(day),
        DayTarget::Day(day) => Err(LedgerRejection::DayOutOfRange {
            day,
            current_day: challenge.current_day,
        }),
    }
}

/// Validate a submission for `day_number` and decide whether the challenge
/// advances.
///
/// `task_types` maps every task of the challenge to its type and
/// `record_exists` reports whether the day already has a record.
pub fn plan_day_upsert(
    challenge: &Challenge,
    day_number: u32,
    record_exists: bool,
    submission: &DaySubmission,
    task_types: &HashMap<Uuid, TaskType>,
) -> Result<DayUpsertPlan, LedgerRejection> {
    let task_records = validate_task_records(&submission.task_records, task_types)?;
    let advances = submission.completed && !record_exists && day_number == challenge.current_day;
    Ok(DayUpsertPlan {
        day_number,
        task_records,
        advance_to: advances.then(|| challenge.current_day.saturating_add(1)),
    })
}

fn validate_task_records(
    submissions: &[TaskRecordSubmission],
    task_types: &HashMap<Uuid, TaskType>,
) -> Result<Vec<ValidatedTaskRecord>, LedgerRejection> {
    let mut seen = HashSet::with_capacity(submissions.len());
    submissions
        .iter()
        .map(|submission| {
            let task_id = submission.task_id;
            let expected = *task_types
                .get(&task_id)
                .ok_or(LedgerRejection::UnknownTask { task_id })?;
            if !seen.insert(task_id) {
                return Err(LedgerRejection::DuplicateTask { task_id });
            }
            let value = match submission.value.as_ref() {
                None | Some(serde_json::Value::Null) => None,
                Some(raw) => Some(
                    TaskValue::from_json(raw, expected)
                        .ok_or(LedgerRejection::ValueMismatch { task_id, expected })?,
                ),
            };
            Ok(ValidatedTaskRecord {
                task_id,
                completed: submission.completed,
                value,
                notes: submission.notes.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
