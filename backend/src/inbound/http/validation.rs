//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request DTOs carry loosely typed fields (strings, signed integers, raw
//! JSON). These helpers convert them into domain values and report failures
//! as `invalid_request` errors with `{ field, value?, code }` details.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    BodyMetrics, ChallengeStatus, EntityName, Error, Rating, SiblingOrder, TaskType,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidTimestamp,
    InvalidName,
    InvalidRating,
    InvalidMetric,
    InvalidDay,
    InvalidPosition,
    InvalidStatus,
    InvalidTaskType,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidName => "invalid_name",
            ErrorCode::InvalidRating => "invalid_rating",
            ErrorCode::InvalidMetric => "invalid_metric",
            ErrorCode::InvalidDay => "invalid_day",
            ErrorCode::InvalidPosition => "invalid_position",
            ErrorCode::InvalidStatus => "invalid_status",
            ErrorCode::InvalidTaskType => "invalid_task_type",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

fn field_value_error(
    field: FieldName,
    code: ErrorCode,
    message: impl Into<String>,
    value: impl Into<serde_json::Value>,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value.into(),
        "code": code.as_str(),
    }))
}

pub(crate) fn parse_uuid(value: String, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(&value).map_err(|_| {
        let name = field.as_str();
        field_value_error(
            field,
            ErrorCode::InvalidUuid,
            format!("{name} must be a valid UUID"),
            value,
        )
    })
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub(crate) fn parse_timestamp(value: String, field: FieldName) -> Result<DateTime<Utc>, Error> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(&value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            let name = field.as_str();
            field_value_error(
                field,
                ErrorCode::InvalidTimestamp,
                format!("{name} must be an RFC 3339 timestamp or a YYYY-MM-DD date"),
                value,
            )
        })
}

pub(crate) fn parse_optional_timestamp(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value.map(|raw| parse_timestamp(raw, field)).transpose()
}

pub(crate) fn parse_name(value: String, field: FieldName) -> Result<EntityName, Error> {
    EntityName::new(&value)
        .map_err(|err| field_error(field, ErrorCode::InvalidName, err.to_string()))
}

pub(crate) fn parse_rating(value: Option<i64>, field: FieldName) -> Result<Option<Rating>, Error> {
    value
        .map(|raw| {
            Rating::new(raw).map_err(|err| {
                field_value_error(field, ErrorCode::InvalidRating, err.to_string(), raw)
            })
        })
        .transpose()
}

/// A positive integer is a position; zero, negatives and absence mean
/// "append".
pub(crate) fn parse_position(value: Option<i64>) -> Option<SiblingOrder> {
    value
        .filter(|raw| *raw > 0)
        .and_then(|raw| SiblingOrder::new(raw).ok())
}

pub(crate) fn parse_target_position(value: i64, field: FieldName) -> Result<SiblingOrder, Error> {
    SiblingOrder::new(value).map_err(|err| {
        field_value_error(field, ErrorCode::InvalidPosition, err.to_string(), value)
    })
}

/// Parse a 1-based day number.
pub(crate) fn parse_day_number(value: i64, field: FieldName) -> Result<u32, Error> {
    u32::try_from(value)
        .ok()
        .filter(|day| *day >= 1)
        .ok_or_else(|| {
            let name = field.as_str();
            field_value_error(
                field,
                ErrorCode::InvalidDay,
                format!("{name} must be a positive day number"),
                value,
            )
        })
}

/// Parse a day number from a path segment.
pub(crate) fn parse_day_segment(value: String, field: FieldName) -> Result<u32, Error> {
    match value.parse::<i64>() {
        Ok(raw) => parse_day_number(raw, field),
        Err(_) => {
            let name = field.as_str();
            Err(field_value_error(
                field,
                ErrorCode::InvalidDay,
                format!("{name} must be a positive day number"),
                value,
            ))
        }
    }
}

/// Zero, negatives and absence defer to the challenge's current day.
pub(crate) fn parse_optional_day_number(
    value: Option<i64>,
    field: FieldName,
) -> Result<Option<u32>, Error> {
    value
        .filter(|raw| *raw > 0)
        .map(|raw| parse_day_number(raw, field))
        .transpose()
}

pub(crate) fn parse_status(value: String, field: FieldName) -> Result<ChallengeStatus, Error> {
    value
        .parse()
        .map_err(|err: crate::domain::ParseChallengeStatusError| {
            field_value_error(field, ErrorCode::InvalidStatus, err.to_string(), value)
        })
}

pub(crate) fn parse_task_type(
    value: Option<String>,
    field: FieldName,
) -> Result<TaskType, Error> {
    match value {
        None => Ok(TaskType::default()),
        Some(raw) => raw.parse().map_err(|err: crate::domain::ParseTaskTypeError| {
            field_value_error(field, ErrorCode::InvalidTaskType, err.to_string(), raw)
        }),
    }
}

/// Raw metric values in request order: weight, chest, waist, hips, arms,
/// thighs. Missing values are zero.
pub(crate) fn parse_metrics(values: [Option<f64>; 6]) -> Result<BodyMetrics, Error> {
    let [weight, chest, waist, hips, arms, thighs] = values.map(|v| v.unwrap_or_default());
    BodyMetrics::new(weight, chest, waist, hips, arms, thighs).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "field": err.metric,
            "code": ErrorCode::InvalidMetric.as_str(),
        }))
    })
}
