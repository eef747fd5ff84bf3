//! Challenge HTTP handlers.
//!
//! ```text
//! GET    /api/challenges
//! POST   /api/challenges
//! GET    /api/challenges/{id}
//! PUT    /api/challenges/{id}
//! DELETE /api/challenges/{id}
//! POST   /api/challenges/{id}/reset
//! GET    /api/challenges/{id}/progress
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    ChallengeProgress, ChallengeRef, CreateChallengeRequest, UpdateChallengeRequest,
};
use crate::domain::{Challenge, Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::{Acknowledgement, ApiEnvelope};
use crate::inbound::http::identity::CallerIdentity;
use crate::inbound::http::schemas::{ChallengeStatusSchema, ErrorSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_day_number, parse_name, parse_optional_timestamp, parse_status,
    parse_timestamp, parse_uuid,
};

/// Request payload for creating a challenge.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChallengeBody {
    #[schema(example = "75 Hard")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to now.
    #[schema(format = "date-time")]
    pub start_date: Option<String>,
    #[schema(format = "date-time")]
    pub end_date: Option<String>,
}

/// Request payload replacing a challenge's editable fields.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChallengeBody {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(format = "date-time")]
    pub start_date: String,
    #[schema(format = "date-time")]
    pub end_date: Option<String>,
    #[schema(minimum = 1)]
    pub current_day: i64,
    #[schema(value_type = ChallengeStatusSchema)]
    pub status: String,
}

/// Challenge as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeBody {
    #[schema(format = "uuid")]
    pub id: String,
    pub name: String,
    pub description: String,
    #[schema(format = "date-time")]
    pub start_date: String,
    #[schema(format = "date-time")]
    pub end_date: Option<String>,
    pub current_day: u32,
    #[schema(value_type = ChallengeStatusSchema)]
    pub status: String,
    #[schema(format = "date-time")]
    pub created_at: String,
    #[schema(format = "date-time")]
    pub updated_at: String,
}

impl From<Challenge> for ChallengeBody {
    fn from(value: Challenge) -> Self {
        Self {
            id: value.id.to_string(),
            name: value.name.into(),
            description: value.description,
            start_date: value.start_date.to_rfc3339(),
            end_date: value.end_date.map(|date| date.to_rfc3339()),
            current_day: value.current_day,
            status: value.status.to_string(),
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

/// Streak report for a challenge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressBody {
    #[schema(format = "uuid")]
    pub challenge_id: String,
    pub current_day: u32,
    #[schema(value_type = ChallengeStatusSchema)]
    pub status: String,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub completed_days: u32,
    /// Percentage of the program completed.
    #[schema(example = 4.0)]
    pub completion_rate: f64,
    #[schema(example = 75)]
    pub total_days: u32,
}

impl From<ChallengeProgress> for ProgressBody {
    fn from(value: ChallengeProgress) -> Self {
        let streaks = value.streaks;
        Self {
            challenge_id: value.challenge_id.to_string(),
            current_day: value.current_day,
            status: value.status.to_string(),
            current_streak: streaks.current_streak,
            longest_streak: streaks.longest_streak,
            completed_days: streaks.completed_days,
            completion_rate: streaks.completion_rate,
            total_days: streaks.total_days,
        }
    }
}

pub(crate) fn challenge_ref(owner: UserId, raw_id: String) -> Result<ChallengeRef, Error> {
    Ok(ChallengeRef {
        owner,
        challenge_id: parse_uuid(raw_id, FieldName::new("challengeId"))?,
    })
}

fn parse_create(owner: UserId, body: CreateChallengeBody) -> Result<CreateChallengeRequest, Error> {
    Ok(CreateChallengeRequest {
        owner,
        name: parse_name(body.name, FieldName::new("name"))?,
        description: body.description.unwrap_or_default(),
        start_date: parse_optional_timestamp(body.start_date, FieldName::new("startDate"))?,
        end_date: parse_optional_timestamp(body.end_date, FieldName::new("endDate"))?,
    })
}

fn parse_update(
    challenge: ChallengeRef,
    body: UpdateChallengeBody,
) -> Result<UpdateChallengeRequest, Error> {
    Ok(UpdateChallengeRequest {
        owner: challenge.owner,
        challenge_id: challenge.challenge_id,
        name: parse_name(body.name, FieldName::new("name"))?,
        description: body.description.unwrap_or_default(),
        start_date: parse_timestamp(body.start_date, FieldName::new("startDate"))?,
        end_date: parse_optional_timestamp(body.end_date, FieldName::new("endDate"))?,
        current_day: parse_day_number(body.current_day, FieldName::new("currentDay"))?,
        status: parse_status(body.status, FieldName::new("status"))?,
    })
}

/// List the caller's challenges, newest first.
#[utoipa::path(
    get,
    path = "/api/challenges",
    responses(
        (status = 200, description = "Challenges owned by the caller", body = ApiEnvelope<Vec<ChallengeBody>>),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["challenges"],
    operation_id = "listChallenges",
    security(("BearerAuth" = []))
)]
#[get("/challenges")]
pub async fn list_challenges(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
) -> ApiResult<web::Json<ApiEnvelope<Vec<ChallengeBody>>>> {
    let challenges = state
        .challenges_query
        .list_challenges(caller.user_id())
        .await?;
    Ok(ApiEnvelope::ok(
        challenges.into_iter().map(ChallengeBody::from).collect(),
    ))
}

/// Start a new challenge on day 1.
#[utoipa::path(
    post,
    path = "/api/challenges",
    request_body = CreateChallengeBody,
    responses(
        (status = 201, description = "Challenge created", body = ApiEnvelope<ChallengeBody>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema)
    ),
    tags = ["challenges"],
    operation_id = "createChallenge",
    security(("BearerAuth" = []))
)]
#[post("/challenges")]
pub async fn create_challenge(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    payload: web::Json<CreateChallengeBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_create(caller.into_user_id(), payload.into_inner())?;
    let challenge = state.challenges.create_challenge(request).await?;
    Ok(ApiEnvelope::created(ChallengeBody::from(challenge)))
}

#[utoipa::path(
    get,
    path = "/api/challenges/{id}",
    params(("id" = String, Path, format = "uuid", description = "Challenge identifier")),
    responses(
        (status = 200, description = "Challenge", body = ApiEnvelope<ChallengeBody>),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["challenges"],
    operation_id = "getChallenge",
    security(("BearerAuth" = []))
)]
#[get("/challenges/{id}")]
pub async fn get_challenge(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApiEnvelope<ChallengeBody>>> {
    let challenge = challenge_ref(caller.into_user_id(), path.into_inner())?;
    let found = state.challenges_query.get_challenge(challenge).await?;
    Ok(ApiEnvelope::ok(ChallengeBody::from(found)))
}

/// Replace a challenge's editable fields, including `currentDay` and `status`.
#[utoipa::path(
    put,
    path = "/api/challenges/{id}",
    params(("id" = String, Path, format = "uuid", description = "Challenge identifier")),
    request_body = UpdateChallengeBody,
    responses(
        (status = 200, description = "Updated challenge", body = ApiEnvelope<ChallengeBody>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["challenges"],
    operation_id = "updateChallenge",
    security(("BearerAuth" = []))
)]
#[put("/challenges/{id}")]
pub async fn update_challenge(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<UpdateChallengeBody>,
) -> ApiResult<web::Json<ApiEnvelope<ChallengeBody>>> {
    let challenge = challenge_ref(caller.into_user_id(), path.into_inner())?;
    let request = parse_update(challenge, payload.into_inner())?;
    let updated = state.challenges.update_challenge(request).await?;
    Ok(ApiEnvelope::ok(ChallengeBody::from(updated)))
}

/// Delete a challenge together with its sections, tasks, entries and
/// measurements.
#[utoipa::path(
    delete,
    path = "/api/challenges/{id}",
    params(("id" = String, Path, format = "uuid", description = "Challenge identifier")),
    responses(
        (status = 200, description = "Challenge deleted", body = Acknowledgement),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["challenges"],
    operation_id = "deleteChallenge",
    security(("BearerAuth" = []))
)]
#[delete("/challenges/{id}")]
pub async fn delete_challenge(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<Acknowledgement>> {
    let challenge = challenge_ref(caller.into_user_id(), path.into_inner())?;
    state.challenges.delete_challenge(challenge).await?;
    Ok(Acknowledgement::ok())
}

/// Restart a challenge at day 1, discarding its entries.
///
/// Sections, tasks and measurements are kept.
#[utoipa::path(
    post,
    path = "/api/challenges/{id}/reset",
    params(("id" = String, Path, format = "uuid", description = "Challenge identifier")),
    responses(
        (status = 200, description = "Challenge reset", body = ApiEnvelope<ChallengeBody>),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["challenges"],
    operation_id = "resetChallenge",
    security(("BearerAuth" = []))
)]
#[post("/challenges/{id}/reset")]
pub async fn reset_challenge(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApiEnvelope<ChallengeBody>>> {
    let challenge = challenge_ref(caller.into_user_id(), path.into_inner())?;
    let reset = state.challenges.reset_challenge(challenge).await?;
    Ok(ApiEnvelope::ok(ChallengeBody::from(reset)))
}

/// Streak and completion report.
#[utoipa::path(
    get,
    path = "/api/challenges/{id}/progress",
    params(("id" = String, Path, format = "uuid", description = "Challenge identifier")),
    responses(
        (status = 200, description = "Progress report", body = ApiEnvelope<ProgressBody>),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["challenges"],
    operation_id = "getChallengeProgress",
    security(("BearerAuth" = []))
)]
#[get("/challenges/{id}/progress")]
pub async fn challenge_progress(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApiEnvelope<ProgressBody>>> {
    let challenge = challenge_ref(caller.into_user_id(), path.into_inner())?;
    let progress = state.challenges_query.challenge_progress(challenge).await?;
    Ok(ApiEnvelope::ok(ProgressBody::from(progress)))
}

#[cfg(test)]
#[path = "challenges_tests.rs"]
mod tests;
