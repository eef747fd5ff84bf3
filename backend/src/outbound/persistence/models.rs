//! Internal Diesel row structs and their conversions to domain types.
//!
//! Rows never leave the persistence layer. Conversions back into the domain
//! re-run the domain constructors, so a corrupt row surfaces as a query error
//! instead of an invalid entity.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    BodyMetrics, Challenge, ChallengeStatus, DayRecord, EntityName, Measurement, Rating, Section,
    SiblingOrder, StrikesPolicy, Task, TaskRecord, TaskType, TaskValue, UserId,
};

use super::schema::{challenges, day_records, measurements, sections, task_records, tasks};

/// Clamp a domain counter into an `INT4` column.
pub(crate) fn to_db_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn from_db_int(value: i32, column: &str) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("negative {column}: {value}"))
}

fn order_from_db(value: i32) -> Result<SiblingOrder, String> {
    SiblingOrder::new(i64::from(value)).map_err(|err| err.to_string())
}

fn rating_from_db(value: Option<i16>) -> Result<Option<Rating>, String> {
    value
        .map(|raw| Rating::new(i64::from(raw)).map_err(|err| err.to_string()))
        .transpose()
}

pub(crate) fn rating_to_db(value: Option<Rating>) -> Option<i16> {
    value.map(|rating| i16::from(rating.get()))
}

// ---------------------------------------------------------------------------
// Challenges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = challenges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ChallengeRow {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub current_day: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ChallengeRow> for Challenge {
    type Error = String;

    fn try_from(row: ChallengeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            owner: UserId::new(row.owner_id).map_err(|err| err.to_string())?,
            name: EntityName::new(&row.name).map_err(|err| err.to_string())?,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            current_day: from_db_int(row.current_day, "current_day")?,
            status: row
                .status
                .parse::<ChallengeStatus>()
                .map_err(|err| err.to_string())?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = challenges)]
pub(crate) struct NewChallengeRow<'a> {
    pub id: Uuid,
    pub owner_id: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub current_day: i32,
    pub status: &'a str,
}

/// Full replacement of a challenge's editable columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = challenges, treat_none_as_null = true)]
pub(crate) struct ChallengeUpdate<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub current_day: i32,
    pub status: &'a str,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sections)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SectionRow {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub name: String,
    pub description: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SectionRow> for Section {
    type Error = String;

    fn try_from(row: SectionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            challenge_id: row.challenge_id,
            name: EntityName::new(&row.name).map_err(|err| err.to_string())?,
            description: row.description,
            order: order_from_db(row.position)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sections)]
pub(crate) struct NewSectionRow<'a> {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub position: i32,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TaskRow {
    pub id: Uuid,
    pub section_id: Uuid,
    pub name: String,
    pub description: String,
    pub task_type: String,
    pub required: bool,
    pub restart_on_fail: bool,
    pub strikes_enabled: bool,
    pub strikes_limit: i32,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = String;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            section_id: row.section_id,
            name: EntityName::new(&row.name).map_err(|err| err.to_string())?,
            description: row.description,
            task_type: row
                .task_type
                .parse::<TaskType>()
                .map_err(|err| err.to_string())?,
            required: row.required,
            restart_on_fail: row.restart_on_fail,
            strikes: StrikesPolicy::from_request(
                row.strikes_enabled,
                Some(i64::from(row.strikes_limit)),
            ),
            order: order_from_db(row.position)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub(crate) struct NewTaskRow<'a> {
    pub id: Uuid,
    pub section_id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub task_type: &'a str,
    pub required: bool,
    pub restart_on_fail: bool,
    pub strikes_enabled: bool,
    pub strikes_limit: i32,
    pub position: i32,
}

/// Task settings columns; the order only changes through a move.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
pub(crate) struct TaskSettingsUpdate<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub task_type: &'a str,
    pub required: bool,
    pub restart_on_fail: bool,
    pub strikes_enabled: bool,
    pub strikes_limit: i32,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Day ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = day_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DayRecordRow {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub day_number: i32,
    pub date: DateTime<Utc>,
    pub completed: bool,
    pub notes: String,
    pub progress_photo_url: Option<String>,
    pub energy_level: Option<i16>,
    pub mood_level: Option<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DayRecordRow> for DayRecord {
    type Error = String;

    fn try_from(row: DayRecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            challenge_id: row.challenge_id,
            day_number: from_db_int(row.day_number, "day_number")?,
            date: row.date,
            completed: row.completed,
            notes: row.notes,
            progress_photo_url: row.progress_photo_url,
            energy_level: rating_from_db(row.energy_level)?,
            mood_level: rating_from_db(row.mood_level)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = day_records)]
pub(crate) struct NewDayRecordRow<'a> {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub day_number: i32,
    pub date: DateTime<Utc>,
    pub completed: bool,
    pub notes: &'a str,
    pub progress_photo_url: Option<&'a str>,
    pub energy_level: Option<i16>,
    pub mood_level: Option<i16>,
}

/// Overwrite of a day's submitted fields. The stamped date is kept.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = day_records, treat_none_as_null = true)]
pub(crate) struct DayRecordUpdate<'a> {
    pub completed: bool,
    pub notes: &'a str,
    pub progress_photo_url: Option<&'a str>,
    pub energy_level: Option<i16>,
    pub mood_level: Option<i16>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = task_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TaskRecordRow {
    pub id: Uuid,
    pub day_record_id: Uuid,
    pub task_id: Uuid,
    pub completed: bool,
    pub value: Option<serde_json::Value>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRecordRow> for TaskRecord {
    type Error = String;

    fn try_from(row: TaskRecordRow) -> Result<Self, Self::Error> {
        let value = row
            .value
            .filter(|raw| !raw.is_null())
            .map(serde_json::from_value::<TaskValue>)
            .transpose()
            .map_err(|err| format!("decode task value: {err}"))?;
        Ok(Self {
            id: row.id,
            day_record_id: row.day_record_id,
            task_id: row.task_id,
            completed: row.completed,
            value,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_records)]
pub(crate) struct NewTaskRecordRow<'a> {
    pub id: Uuid,
    pub day_record_id: Uuid,
    pub task_id: Uuid,
    pub completed: bool,
    pub value: Option<serde_json::Value>,
    pub notes: &'a str,
}

// ---------------------------------------------------------------------------
// Measurements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = measurements)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MeasurementRow {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub day_number: i32,
    pub date: DateTime<Utc>,
    pub weight: f64,
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub arms: f64,
    pub thighs: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<MeasurementRow> for Measurement {
    type Error = String;

    fn try_from(row: MeasurementRow) -> Result<Self, Self::Error> {
        let metrics = BodyMetrics::new(
            row.weight, row.chest, row.waist, row.hips, row.arms, row.thighs,
        )
        .map_err(|err| err.to_string())?;
        Ok(Self {
            id: row.id,
            challenge_id: row.challenge_id,
            day_number: from_db_int(row.day_number, "day_number")?,
            date: row.date,
            metrics,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = measurements)]
pub(crate) struct NewMeasurementRow {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub day_number: i32,
    pub date: DateTime<Utc>,
    pub weight: f64,
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub arms: f64,
    pub thighs: f64,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = measurements)]
pub(crate) struct MeasurementUpdate {
    pub day_number: i32,
    pub date: DateTime<Utc>,
    pub weight: f64,
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub arms: f64,
    pub thighs: f64,
    pub updated_at: DateTime<Utc>,
}

impl MeasurementUpdate {
    pub(crate) fn new(
        day_number: u32,
        date: DateTime<Utc>,
        metrics: &BodyMetrics,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            day_number: to_db_int(day_number),
            date,
            weight: metrics.weight,
            chest: metrics.chest,
            waist: metrics.waist,
            hips: metrics.hips,
            arms: metrics.arms,
            thighs: metrics.thighs,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn task_record_row(value: Option<serde_json::Value>) -> TaskRecordRow {
        let now = Utc::now();
        TaskRecordRow {
            id: Uuid::new_v4(),
            day_record_id: Uuid::new_v4(),
            task_id: Uuid::new_v4(),
            completed: true,
            value,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(json!(null)), None)]
    #[case(Some(json!(true)), Some(TaskValue::Boolean(true)))]
    #[case(Some(json!(2.5)), Some(TaskValue::Number(2.5)))]
    #[case(Some(json!("ran 5k")), Some(TaskValue::Text("ran 5k".into())))]
    fn task_record_values_decode_untagged(
        #[case] stored: Option<serde_json::Value>,
        #[case] expected: Option<TaskValue>,
    ) {
        let record = TaskRecord::try_from(task_record_row(stored)).expect("valid row");
        assert_eq!(record.value, expected);
    }

    #[rstest]
    fn unexpected_json_shape_is_an_error() {
        let err = TaskRecord::try_from(task_record_row(Some(json!({"nested": 1}))))
            .expect_err("objects are not task values");
        assert!(err.starts_with("decode task value"));
    }

    #[rstest]
    fn corrupt_challenge_status_is_rejected() {
        let now = Utc::now();
        let row = ChallengeRow {
            id: Uuid::new_v4(),
            owner_id: "user_1".into(),
            name: "75 Hard".into(),
            description: String::new(),
            start_date: now,
            end_date: None,
            current_day: 1,
            status: "paused".into(),
            created_at: now,
            updated_at: now,
        };
        assert!(Challenge::try_from(row).is_err());
    }

    #[rstest]
    #[case(0, None)]
    #[case(3, Some(3))]
    fn section_orders_must_be_positive(#[case] stored: i32, #[case] expected: Option<u32>) {
        let now = Utc::now();
        let row = SectionRow {
            id: Uuid::new_v4(),
            challenge_id: Uuid::new_v4(),
            name: "Fitness".into(),
            description: String::new(),
            position: stored,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            Section::try_from(row).ok().map(|section| section.order.get()),
            expected
        );
    }

    #[rstest]
    fn counters_saturate_into_int4() {
        assert_eq!(to_db_int(u32::MAX), i32::MAX);
        assert_eq!(to_db_int(75), 75);
    }
}
