//! Day ledger HTTP handlers.
//!
//! ```text
//! GET  /api/challenges/{id}/entries
//! POST /api/challenges/{id}/entries          (current day)
//! GET  /api/challenges/{id}/entries/{day}
//! PUT  /api/challenges/{id}/entries/{day}
//! ```
//!
//! Writes are upserts keyed by day number. The first completed write for the
//! current day advances the challenge by one day.

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{ChallengeRef, DayRef, UpsertDayRequest, UpsertDayResponse};
use crate::domain::{
    DayEntry, DayRecord, DaySubmission, DayTarget, Error, TaskRecord, TaskRecordSubmission,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::challenges::challenge_ref;
use crate::inbound::http::envelope::ApiEnvelope;
use crate::inbound::http::identity::CallerIdentity;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_day_segment, parse_rating, parse_uuid,
};

/// Outcome of one task as submitted.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecordInput {
    #[schema(format = "uuid")]
    pub task_id: String,
    #[serde(default)]
    pub completed: bool,
    /// Boolean, number or string matching the task's type.
    #[schema(value_type = Option<Object>)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Day payload for an upsert.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DaySubmissionBody {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
    pub progress_photo_url: Option<String>,
    #[schema(minimum = 0, maximum = 10)]
    pub energy_level: Option<i64>,
    #[schema(minimum = 0, maximum = 10)]
    pub mood_level: Option<i64>,
    #[serde(default)]
    pub task_records: Vec<TaskRecordInput>,
}

/// Day record without its task records.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayRecordBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub challenge_id: String,
    pub day_number: u32,
    #[schema(format = "date-time")]
    pub date: String,
    pub completed: bool,
    pub notes: String,
    pub progress_photo_url: Option<String>,
    pub energy_level: Option<u8>,
    pub mood_level: Option<u8>,
    #[schema(format = "date-time")]
    pub created_at: String,
    #[schema(format = "date-time")]
    pub updated_at: String,
}

impl From<DayRecord> for DayRecordBody {
    fn from(value: DayRecord) -> Self {
        Self {
            id: value.id.to_string(),
            challenge_id: value.challenge_id.to_string(),
            day_number: value.day_number,
            date: value.date.to_rfc3339(),
            completed: value.completed,
            notes: value.notes,
            progress_photo_url: value.progress_photo_url,
            energy_level: value.energy_level.map(|rating| rating.get()),
            mood_level: value.mood_level.map(|rating| rating.get()),
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

/// Recorded outcome of one task.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecordBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub task_id: String,
    pub completed: bool,
    #[schema(value_type = Option<Object>)]
    pub value: Option<serde_json::Value>,
    pub notes: String,
}

impl From<TaskRecord> for TaskRecordBody {
    fn from(value: TaskRecord) -> Self {
        Self {
            id: value.id.to_string(),
            task_id: value.task_id.to_string(),
            completed: value.completed,
            value: value
                .value
                .and_then(|typed| serde_json::to_value(typed).ok()),
            notes: value.notes,
        }
    }
}

/// Day record with its task records.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayEntryBody {
    #[serde(flatten)]
    pub record: DayRecordBody,
    pub task_records: Vec<TaskRecordBody>,
}

impl From<DayEntry> for DayEntryBody {
    fn from(value: DayEntry) -> Self {
        Self {
            record: value.record.into(),
            task_records: value.task_records.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertDayBody {
    pub entry: DayEntryBody,
    /// Whether the write created the day's record.
    pub created: bool,
    /// New current day when the write advanced the challenge.
    pub advanced_to: Option<u32>,
}

impl From<UpsertDayResponse> for UpsertDayBody {
    fn from(value: UpsertDayResponse) -> Self {
        Self {
            entry: value.entry.into(),
            created: value.created,
            advanced_to: value.advanced_to,
        }
    }
}

fn parse_submission(body: DaySubmissionBody) -> Result<DaySubmission, Error> {
    let task_records = body
        .task_records
        .into_iter()
        .map(|record| {
            Ok(TaskRecordSubmission {
                task_id: parse_uuid(record.task_id, FieldName::new("taskRecords.taskId"))?,
                completed: record.completed,
                value: record.value,
                notes: record.notes.unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(DaySubmission {
        completed: body.completed,
        notes: body.notes.unwrap_or_default(),
        progress_photo_url: body.progress_photo_url.filter(|url| !url.trim().is_empty()),
        energy_level: parse_rating(body.energy_level, FieldName::new("energyLevel"))?,
        mood_level: parse_rating(body.mood_level, FieldName::new("moodLevel"))?,
        task_records,
    })
}

fn day_ref(challenge: ChallengeRef, raw_day: String) -> Result<DayRef, Error> {
    Ok(DayRef {
        challenge,
        day_number: parse_day_segment(raw_day, FieldName::new("day"))?,
    })
}

async fn upsert(
    state: &HttpState,
    challenge: ChallengeRef,
    target: DayTarget,
    body: DaySubmissionBody,
) -> ApiResult<HttpResponse> {
    let submission = parse_submission(body)?;
    let response = state
        .ledger
        .upsert_day(UpsertDayRequest {
            challenge,
            target,
            submission,
        })
        .await?;
    let body = UpsertDayBody::from(response);
    if body.created {
        Ok(ApiEnvelope::created(body))
    } else {
        Ok(HttpResponse::Ok().json(ApiEnvelope::new(body)))
    }
}

/// List recorded days in ascending day order.
#[utoipa::path(
    get,
    path = "/api/challenges/{id}/entries",
    params(("id" = String, Path, format = "uuid", description = "Challenge identifier")),
    responses(
        (status = 200, description = "Day records", body = ApiEnvelope<Vec<DayRecordBody>>),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Challenge not found", body = ErrorSchema)
    ),
    tags = ["entries"],
    operation_id = "listEntries",
    security(("BearerAuth" = []))
)]
#[get("/challenges/{id}/entries")]
pub async fn list_entries(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApiEnvelope<Vec<DayRecordBody>>>> {
    let challenge = challenge_ref(caller.into_user_id(), path.into_inner())?;
    let days = state.ledger_query.list_days(challenge).await?;
    Ok(ApiEnvelope::ok(days.into_iter().map(Into::into).collect()))
}

/// Record the challenge's current day.
#[utoipa::path(
    post,
    path = "/api/challenges/{id}/entries",
    params(("id" = String, Path, format = "uuid", description = "Challenge identifier")),
    request_body = DaySubmissionBody,
    responses(
        (status = 201, description = "Day recorded for the first time", body = ApiEnvelope<UpsertDayBody>),
        (status = 200, description = "Existing day updated", body = ApiEnvelope<UpsertDayBody>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Challenge not found", body = ErrorSchema),
        (status = 409, description = "Challenge is not active", body = ErrorSchema)
    ),
    tags = ["entries"],
    operation_id = "upsertToday",
    security(("BearerAuth" = []))
)]
#[post("/challenges/{id}/entries")]
pub async fn upsert_today(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<DaySubmissionBody>,
) -> ApiResult<HttpResponse> {
    let challenge = challenge_ref(caller.into_user_id(), path.into_inner())?;
    upsert(&state, challenge, DayTarget::Current, payload.into_inner()).await
}

#[utoipa::path(
    get,
    path = "/api/challenges/{id}/entries/{day}",
    params(
        ("id" = String, Path, format = "uuid", description = "Challenge identifier"),
        ("day" = u32, Path, description = "1-based day number")
    ),
    responses(
        (status = 200, description = "Day entry", body = ApiEnvelope<DayEntryBody>),
        (status = 400, description = "Invalid day", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "No entry for that day", body = ErrorSchema)
    ),
    tags = ["entries"],
    operation_id = "getEntry",
    security(("BearerAuth" = []))
)]
#[get("/challenges/{id}/entries/{day}")]
pub async fn get_entry(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<ApiEnvelope<DayEntryBody>>> {
    let (raw_id, raw_day) = path.into_inner();
    let challenge = challenge_ref(caller.into_user_id(), raw_id)?;
    let entry = state.ledger_query.get_day(day_ref(challenge, raw_day)?).await?;
    Ok(ApiEnvelope::ok(entry.into()))
}

/// Record or amend a specific day up to the current one.
#[utoipa::path(
    put,
    path = "/api/challenges/{id}/entries/{day}",
    params(
        ("id" = String, Path, format = "uuid", description = "Challenge identifier"),
        ("day" = u32, Path, description = "1-based day number, at most the current day")
    ),
    request_body = DaySubmissionBody,
    responses(
        (status = 201, description = "Day recorded for the first time", body = ApiEnvelope<UpsertDayBody>),
        (status = 200, description = "Existing day updated", body = ApiEnvelope<UpsertDayBody>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Challenge not found", body = ErrorSchema),
        (status = 409, description = "Challenge is not active", body = ErrorSchema)
    ),
    tags = ["entries"],
    operation_id = "upsertEntry",
    security(("BearerAuth" = []))
)]
#[put("/challenges/{id}/entries/{day}")]
pub async fn upsert_entry(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<(String, String)>,
    payload: web::Json<DaySubmissionBody>,
) -> ApiResult<HttpResponse> {
    let (raw_id, raw_day) = path.into_inner();
    let challenge = challenge_ref(caller.into_user_id(), raw_id)?;
    let day = day_ref(challenge, raw_day)?;
    upsert(
        &state,
        day.challenge,
        DayTarget::Day(day.day_number),
        payload.into_inner(),
    )
    .await
}

#[cfg(test)]
#[path = "entries_tests.rs"]
mod tests;
