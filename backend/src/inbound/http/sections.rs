//! Section HTTP handlers.
//!
//! ```text
//! GET    /api/challenges/{id}/sections
//! POST   /api/challenges/{id}/sections
//! PUT    /api/sections/{id}
//! DELETE /api/sections/{id}
//! PUT    /api/sections/{id}/order
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    CreateSectionRequest, MoveSectionRequest, SectionRef, UpdateSectionRequest,
};
use crate::domain::{Error, Section, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::challenges::challenge_ref;
use crate::inbound::http::envelope::{Acknowledgement, ApiEnvelope};
use crate::inbound::http::identity::CallerIdentity;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_name, parse_position, parse_target_position, parse_uuid,
};

/// Request payload for creating a section.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSectionBody {
    #[schema(example = "Fitness")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// 1-based position; omitted or non-positive appends.
    pub order: Option<i64>,
}

/// Request payload for renaming a section.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSectionBody {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Target position for a move.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveBody {
    /// 1-based target position. Targets past the end leave a gap.
    #[schema(minimum = 1, example = 2)]
    pub order: i64,
}

/// Section as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub challenge_id: String,
    pub name: String,
    pub description: String,
    pub order: u32,
    #[schema(format = "date-time")]
    pub created_at: String,
    #[schema(format = "date-time")]
    pub updated_at: String,
}

impl From<Section> for SectionBody {
    fn from(value: Section) -> Self {
        Self {
            id: value.id.to_string(),
            challenge_id: value.challenge_id.to_string(),
            name: value.name.into(),
            description: value.description,
            order: value.order.get(),
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

pub(crate) fn section_ref(owner: UserId, raw_id: String) -> Result<SectionRef, Error> {
    Ok(SectionRef {
        owner,
        section_id: parse_uuid(raw_id, FieldName::new("sectionId"))?,
    })
}

/// List a challenge's sections in order.
#[utoipa::path(
    get,
    path = "/api/challenges/{id}/sections",
    params(("id" = String, Path, format = "uuid", description = "Challenge identifier")),
    responses(
        (status = 200, description = "Sections ordered by position", body = ApiEnvelope<Vec<SectionBody>>),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Challenge not found", body = ErrorSchema)
    ),
    tags = ["sections"],
    operation_id = "listSections",
    security(("BearerAuth" = []))
)]
#[get("/challenges/{id}/sections")]
pub async fn list_sections(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApiEnvelope<Vec<SectionBody>>>> {
    let challenge = challenge_ref(caller.into_user_id(), path.into_inner())?;
    let sections = state.sections_query.list_sections(challenge).await?;
    Ok(ApiEnvelope::ok(
        sections.into_iter().map(SectionBody::from).collect(),
    ))
}

/// Add a section, shifting later siblings when a position is given.
#[utoipa::path(
    post,
    path = "/api/challenges/{id}/sections",
    params(("id" = String, Path, format = "uuid", description = "Challenge identifier")),
    request_body = CreateSectionBody,
    responses(
        (status = 201, description = "Section created", body = ApiEnvelope<SectionBody>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Challenge not found", body = ErrorSchema)
    ),
    tags = ["sections"],
    operation_id = "createSection",
    security(("BearerAuth" = []))
)]
#[post("/challenges/{id}/sections")]
pub async fn create_section(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<CreateSectionBody>,
) -> ApiResult<HttpResponse> {
    let challenge = challenge_ref(caller.into_user_id(), path.into_inner())?;
    let body = payload.into_inner();
    let request = CreateSectionRequest {
        owner: challenge.owner,
        challenge_id: challenge.challenge_id,
        name: parse_name(body.name, FieldName::new("name"))?,
        description: body.description.unwrap_or_default(),
        position: parse_position(body.order),
    };
    let section = state.sections.create_section(request).await?;
    Ok(ApiEnvelope::created(SectionBody::from(section)))
}

#[utoipa::path(
    put,
    path = "/api/sections/{id}",
    params(("id" = String, Path, format = "uuid", description = "Section identifier")),
    request_body = UpdateSectionBody,
    responses(
        (status = 200, description = "Updated section", body = ApiEnvelope<SectionBody>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["sections"],
    operation_id = "updateSection",
    security(("BearerAuth" = []))
)]
#[put("/sections/{id}")]
pub async fn update_section(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<UpdateSectionBody>,
) -> ApiResult<web::Json<ApiEnvelope<SectionBody>>> {
    let section = section_ref(caller.into_user_id(), path.into_inner())?;
    let body = payload.into_inner();
    let request = UpdateSectionRequest {
        section,
        name: parse_name(body.name, FieldName::new("name"))?,
        description: body.description.unwrap_or_default(),
    };
    let updated = state.sections.update_section(request).await?;
    Ok(ApiEnvelope::ok(SectionBody::from(updated)))
}

/// Move a section to a new position among its siblings.
#[utoipa::path(
    put,
    path = "/api/sections/{id}/order",
    params(("id" = String, Path, format = "uuid", description = "Section identifier")),
    request_body = MoveBody,
    responses(
        (status = 200, description = "Moved section", body = ApiEnvelope<SectionBody>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["sections"],
    operation_id = "moveSection",
    security(("BearerAuth" = []))
)]
#[put("/sections/{id}/order")]
pub async fn move_section(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<MoveBody>,
) -> ApiResult<web::Json<ApiEnvelope<SectionBody>>> {
    let section = section_ref(caller.into_user_id(), path.into_inner())?;
    let target = parse_target_position(payload.order, FieldName::new("order"))?;
    let moved = state
        .sections
        .move_section(MoveSectionRequest { section, target })
        .await?;
    Ok(ApiEnvelope::ok(SectionBody::from(moved)))
}

/// Delete a section and its tasks, then close the gap in sibling order.
#[utoipa::path(
    delete,
    path = "/api/sections/{id}",
    params(("id" = String, Path, format = "uuid", description = "Section identifier")),
    responses(
        (status = 200, description = "Section deleted", body = Acknowledgement),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["sections"],
    operation_id = "deleteSection",
    security(("BearerAuth" = []))
)]
#[delete("/sections/{id}")]
pub async fn delete_section(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<Acknowledgement>> {
    let section = section_ref(caller.into_user_id(), path.into_inner())?;
    state.sections.delete_section(section).await?;
    Ok(Acknowledgement::ok())
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use super::*;
    use crate::domain::service_test_support::{order, sample_section};
    use crate::inbound::http::test_utils::{MockPorts, bearer};

    async fn send(ports: MockPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
        let app = actix_test::init_service(ports.into_app()).await;
        let res =
            actix_test::call_service(&app, request.insert_header(bearer()).to_request()).await;
        let status = res.status();
        (status, actix_test::read_body_json(res).await)
    }

    #[rstest]
    #[case(json!({"name": "Diet"}), None)]
    #[case(json!({"name": "Diet", "order": 0}), None)]
    #[case(json!({"name": "Diet", "order": -2}), None)]
    #[case(json!({"name": "Diet", "order": 2}), Some(2))]
    #[actix_web::test]
    async fn create_maps_order_to_position(#[case] payload: Value, #[case] expected: Option<u32>) {
        let challenge_id = Uuid::new_v4();
        let mut ports = MockPorts::default();
        ports
            .sections
            .expect_create_section()
            .withf(move |req| {
                req.challenge_id == challenge_id && req.position.map(|p| p.get()) == expected
            })
            .times(1)
            .returning(|req| {
                let position = req.position.map_or(1, |p| i64::from(p.get()));
                Ok(sample_section(req.challenge_id, position))
            });

        let (status, body) = send(
            ports,
            actix_test::TestRequest::post()
                .uri(&format!("/api/challenges/{challenge_id}/sections"))
                .set_json(payload),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["challengeId"], challenge_id.to_string());
    }

    #[rstest]
    #[actix_web::test]
    async fn list_returns_sections_in_service_order() {
        let challenge_id = Uuid::new_v4();
        let mut ports = MockPorts::default();
        ports.sections_query.expect_list_sections().returning(move |_| {
            Ok(vec![
                sample_section(challenge_id, 1),
                sample_section(challenge_id, 2),
            ])
        });

        let (status, body) = send(
            ports,
            actix_test::TestRequest::get().uri(&format!("/api/challenges/{challenge_id}/sections")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["order"], 1);
        assert_eq!(body["data"][1]["order"], 2);
    }

    #[rstest]
    #[actix_web::test]
    async fn move_passes_target_position() {
        let section_id = Uuid::new_v4();
        let mut ports = MockPorts::default();
        ports
            .sections
            .expect_move_section()
            .withf(move |req| req.section.section_id == section_id && req.target == order(3))
            .returning(|req| Ok(sample_section(Uuid::new_v4(), i64::from(req.target.get()))));

        let (status, body) = send(
            ports,
            actix_test::TestRequest::put()
                .uri(&format!("/api/sections/{section_id}/order"))
                .set_json(json!({"order": 3})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["order"], 3);
    }

    #[rstest]
    #[actix_web::test]
    async fn move_rejects_zero_target() {
        let (status, body) = send(
            MockPorts::default(),
            actix_test::TestRequest::put()
                .uri(&format!("/api/sections/{}/order", Uuid::new_v4()))
                .set_json(json!({"order": 0})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["code"], "invalid_position");
    }

    #[rstest]
    #[actix_web::test]
    async fn delete_of_foreign_section_is_not_found() {
        let mut ports = MockPorts::default();
        ports
            .sections
            .expect_delete_section()
            .returning(|section| Err(Error::not_found(format!("section {} not found", section.section_id))));

        let (status, body) = send(
            ports,
            actix_test::TestRequest::delete().uri(&format!("/api/sections/{}", Uuid::new_v4())),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not_found");
    }
}
