//! Tasks are the individual daily habits tracked inside a section.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EntityName, SiblingOrder};

/// Strike limit applied when strikes are enabled without a positive limit.
pub const DEFAULT_STRIKES_LIMIT: u32 = 3;

/// Largest limit representable by the storage column.
const STRIKES_LIMIT_MAX: i64 = i32::MAX as i64;

/// Kind of value recorded for a task each day.
///
/// # Examples
/// ```
/// use hardinfinity::domain::TaskType;
///
/// assert_eq!("number".parse::<TaskType>(), Ok(TaskType::Number));
/// assert_eq!(TaskType::default(), TaskType::Boolean);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Done or not done.
    #[default]
    Boolean,
    /// A numeric amount such as litres of water.
    Number,
    /// Free text.
    Text,
}

impl TaskType {
    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown task type string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task type: {input}")]
pub struct ParseTaskTypeError {
    /// The unrecognised input value.
    pub input: String,
}

impl FromStr for TaskType {
    type Err = ParseTaskTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(Self::Boolean),
            "number" => Ok(Self::Number),
            "text" => Ok(Self::Text),
            _ => Err(ParseTaskTypeError {
                input: s.to_owned(),
            }),
        }
    }
}

/// How many missed days a task tolerates before it counts as failed.
///
/// # Examples
/// ```
/// use hardinfinity::domain::StrikesPolicy;
///
/// assert_eq!(StrikesPolicy::from_request(true, None).limit(), 3);
/// assert_eq!(StrikesPolicy::from_request(true, Some(5)).limit(), 5);
/// assert!(!StrikesPolicy::from_request(false, Some(2)).enabled());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrikesPolicy {
    enabled: bool,
    limit: u32,
}

impl StrikesPolicy {
    /// Normalise a requested policy.
    ///
    /// An enabled policy without a positive limit falls back to
    /// [`DEFAULT_STRIKES_LIMIT`]. A disabled policy keeps a positive limit
    /// so re-enabling it restores the previous value.
    pub fn from_request(enabled: bool, limit: Option<i64>) -> Self {
        let positive = limit
            .filter(|value| *value > 0)
            .map(|value| u32::try_from(value.min(STRIKES_LIMIT_MAX)).unwrap_or(u32::MAX));
        let limit = match (enabled, positive) {
            (_, Some(value)) => value,
            (true, None) => DEFAULT_STRIKES_LIMIT,
            (false, None) => 0,
        };
        Self { enabled, limit }
    }

    /// A policy with strikes switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            limit: 0,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for StrikesPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Persisted task, ordered among the tasks of its section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub section_id: Uuid,
    pub name: EntityName,
    pub description: String,
    pub task_type: TaskType,
    pub required: bool,
    /// Missing this task restarts the whole challenge.
    pub restart_on_fail: bool,
    pub strikes: StrikesPolicy,
    pub order: SiblingOrder,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes shared by task creation and replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSettings {
    pub name: EntityName,
    pub description: String,
    pub task_type: TaskType,
    pub required: bool,
    pub restart_on_fail: bool,
    pub strikes: StrikesPolicy,
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub id: Uuid,
    pub section_id: Uuid,
    pub settings: TaskSettings,
    /// Requested position; appended when absent.
    pub position: Option<SiblingOrder>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(true, None, true, 3)]
    #[case(true, Some(0), true, 3)]
    #[case(true, Some(-2), true, 3)]
    #[case(true, Some(7), true, 7)]
    #[case(false, None, false, 0)]
    #[case(false, Some(4), false, 4)]
    fn strikes_policy_normalises_limits(
        #[case] enabled: bool,
        #[case] limit: Option<i64>,
        #[case] expected_enabled: bool,
        #[case] expected_limit: u32,
    ) {
        let policy = StrikesPolicy::from_request(enabled, limit);
        assert_eq!(policy.enabled(), expected_enabled);
        assert_eq!(policy.limit(), expected_limit);
    }

    #[rstest]
    fn oversized_limits_saturate() {
        let policy = StrikesPolicy::from_request(true, Some(i64::MAX));
        assert_eq!(i64::from(policy.limit()), STRIKES_LIMIT_MAX);
    }

    #[rstest]
    #[case("boolean", TaskType::Boolean)]
    #[case("number", TaskType::Number)]
    #[case("text", TaskType::Text)]
    fn task_type_parses(#[case] raw: &str, #[case] expected: TaskType) {
        assert_eq!(raw.parse::<TaskType>(), Ok(expected));
        assert_eq!(expected.as_str(), raw);
    }

    #[rstest]
    fn unknown_task_type_is_rejected() {
        assert!("checkbox".parse::<TaskType>().is_err());
    }
}
