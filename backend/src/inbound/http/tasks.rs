//! Task HTTP handlers.
//!
//! ```text
//! GET    /api/sections/{id}/tasks
//! POST   /api/sections/{id}/tasks
//! PUT    /api/tasks/{id}
//! DELETE /api/tasks/{id}
//! PUT    /api/tasks/{id}/order
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{CreateTaskRequest, MoveTaskRequest, TaskRef, UpdateTaskRequest};
use crate::domain::{Error, StrikesPolicy, Task, TaskSettings, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::{Acknowledgement, ApiEnvelope};
use crate::inbound::http::identity::CallerIdentity;
use crate::inbound::http::schemas::{ErrorSchema, TaskTypeSchema};
use crate::inbound::http::sections::{MoveBody, section_ref};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_name, parse_position, parse_target_position, parse_task_type, parse_uuid,
};

/// Task definition as submitted on create and update.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskSettingsBody {
    #[schema(example = "Drink a gallon of water")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to `boolean`.
    #[schema(value_type = Option<TaskTypeSchema>)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub restart_on_fail: bool,
    #[serde(default)]
    pub strikes_enabled: bool,
    /// Defaults to 3 when strikes are enabled.
    pub strikes_limit: Option<i64>,
}

/// Request payload for creating a task.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskBody {
    #[serde(flatten)]
    pub settings: TaskSettingsBody,
    /// 1-based position; omitted or non-positive appends.
    pub order: Option<i64>,
}

/// Task as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub section_id: String,
    pub name: String,
    pub description: String,
    #[schema(value_type = TaskTypeSchema)]
    pub task_type: String,
    pub required: bool,
    pub restart_on_fail: bool,
    pub strikes_enabled: bool,
    pub strikes_limit: u32,
    pub order: u32,
    #[schema(format = "date-time")]
    pub created_at: String,
    #[schema(format = "date-time")]
    pub updated_at: String,
}

impl From<Task> for TaskBody {
    fn from(value: Task) -> Self {
        Self {
            id: value.id.to_string(),
            section_id: value.section_id.to_string(),
            name: value.name.into(),
            description: value.description,
            task_type: value.task_type.to_string(),
            required: value.required,
            restart_on_fail: value.restart_on_fail,
            strikes_enabled: value.strikes.enabled(),
            strikes_limit: value.strikes.limit(),
            order: value.order.get(),
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

fn task_ref(owner: UserId, raw_id: String) -> Result<TaskRef, Error> {
    Ok(TaskRef {
        owner,
        task_id: parse_uuid(raw_id, FieldName::new("taskId"))?,
    })
}

fn parse_settings(body: TaskSettingsBody) -> Result<TaskSettings, Error> {
    Ok(TaskSettings {
        name: parse_name(body.name, FieldName::new("name"))?,
        description: body.description.unwrap_or_default(),
        task_type: parse_task_type(body.task_type, FieldName::new("taskType"))?,
        required: body.required,
        restart_on_fail: body.restart_on_fail,
        strikes: StrikesPolicy::from_request(body.strikes_enabled, body.strikes_limit),
    })
}

/// List a section's tasks in order.
#[utoipa::path(
    get,
    path = "/api/sections/{id}/tasks",
    params(("id" = String, Path, format = "uuid", description = "Section identifier")),
    responses(
        (status = 200, description = "Tasks ordered by position", body = ApiEnvelope<Vec<TaskBody>>),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Section not found", body = ErrorSchema)
    ),
    tags = ["tasks"],
    operation_id = "listTasks",
    security(("BearerAuth" = []))
)]
#[get("/sections/{id}/tasks")]
pub async fn list_tasks(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApiEnvelope<Vec<TaskBody>>>> {
    let section = section_ref(caller.into_user_id(), path.into_inner())?;
    let tasks = state.tasks_query.list_tasks(section).await?;
    Ok(ApiEnvelope::ok(tasks.into_iter().map(TaskBody::from).collect()))
}

/// Add a task to a section.
#[utoipa::path(
    post,
    path = "/api/sections/{id}/tasks",
    params(("id" = String, Path, format = "uuid", description = "Section identifier")),
    request_body = CreateTaskBody,
    responses(
        (status = 201, description = "Task created", body = ApiEnvelope<TaskBody>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Section not found", body = ErrorSchema)
    ),
    tags = ["tasks"],
    operation_id = "createTask",
    security(("BearerAuth" = []))
)]
#[post("/sections/{id}/tasks")]
pub async fn create_task(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<CreateTaskBody>,
) -> ApiResult<HttpResponse> {
    let section = section_ref(caller.into_user_id(), path.into_inner())?;
    let body = payload.into_inner();
    let position = parse_position(body.order);
    let request = CreateTaskRequest {
        section,
        settings: parse_settings(body.settings)?,
        position,
    };
    let task = state.tasks.create_task(request).await?;
    Ok(ApiEnvelope::created(TaskBody::from(task)))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    params(("id" = String, Path, format = "uuid", description = "Task identifier")),
    request_body = TaskSettingsBody,
    responses(
        (status = 200, description = "Updated task", body = ApiEnvelope<TaskBody>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["tasks"],
    operation_id = "updateTask",
    security(("BearerAuth" = []))
)]
#[put("/tasks/{id}")]
pub async fn update_task(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<TaskSettingsBody>,
) -> ApiResult<web::Json<ApiEnvelope<TaskBody>>> {
    let task = task_ref(caller.into_user_id(), path.into_inner())?;
    let settings = parse_settings(payload.into_inner())?;
    let updated = state
        .tasks
        .update_task(UpdateTaskRequest { task, settings })
        .await?;
    Ok(ApiEnvelope::ok(TaskBody::from(updated)))
}

/// Move a task to a new position within its section.
#[utoipa::path(
    put,
    path = "/api/tasks/{id}/order",
    params(("id" = String, Path, format = "uuid", description = "Task identifier")),
    request_body = MoveBody,
    responses(
        (status = 200, description = "Moved task", body = ApiEnvelope<TaskBody>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["tasks"],
    operation_id = "moveTask",
    security(("BearerAuth" = []))
)]
#[put("/tasks/{id}/order")]
pub async fn move_task(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<MoveBody>,
) -> ApiResult<web::Json<ApiEnvelope<TaskBody>>> {
    let task = task_ref(caller.into_user_id(), path.into_inner())?;
    let target = parse_target_position(payload.order, FieldName::new("order"))?;
    let moved = state
        .tasks
        .move_task(MoveTaskRequest { task, target })
        .await?;
    Ok(ApiEnvelope::ok(TaskBody::from(moved)))
}

/// Delete a task and its recorded outcomes.
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    params(("id" = String, Path, format = "uuid", description = "Task identifier")),
    responses(
        (status = 200, description = "Task deleted", body = Acknowledgement),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["tasks"],
    operation_id = "deleteTask",
    security(("BearerAuth" = []))
)]
#[delete("/tasks/{id}")]
pub async fn delete_task(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<Acknowledgement>> {
    let task = task_ref(caller.into_user_id(), path.into_inner())?;
    state.tasks.delete_task(task).await?;
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
    use crate::domain::TaskType;
    use crate::domain::service_test_support::sample_task;
    use crate::inbound::http::test_utils::{MockPorts, bearer};

    async fn send(ports: MockPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
        let app = actix_test::init_service(ports.into_app()).await;
        let res =
            actix_test::call_service(&app, request.insert_header(bearer()).to_request()).await;
        let status = res.status();
        (status, actix_test::read_body_json(res).await)
    }

    #[rstest]
    #[case(json!({"strikesEnabled": true}), true, 3)]
    #[case(json!({"strikesEnabled": true, "strikesLimit": 0}), true, 3)]
    #[case(json!({"strikesEnabled": true, "strikesLimit": 5}), true, 5)]
    #[case(json!({}), false, 0)]
    #[actix_web::test]
    async fn create_normalises_strikes_policy(
        #[case] strikes: Value,
        #[case] enabled: bool,
        #[case] limit: u32,
    ) {
        let section_id = Uuid::new_v4();
        let mut payload = json!({"name": "Workout", "taskType": "number", "required": true});
        if let (Some(target), Some(extra)) = (payload.as_object_mut(), strikes.as_object()) {
            target.extend(extra.clone());
        }
        let mut ports = MockPorts::default();
        ports
            .tasks
            .expect_create_task()
            .withf(move |req| {
                req.section.section_id == section_id
                    && req.settings.task_type == TaskType::Number
                    && req.settings.strikes.enabled() == enabled
                    && req.settings.strikes.limit() == limit
            })
            .times(1)
            .returning(|req| {
                let mut task = sample_task(req.section.section_id, 1);
                task.strikes = req.settings.strikes;
                Ok(task)
            });

        let (status, body) = send(
            ports,
            actix_test::TestRequest::post()
                .uri(&format!("/api/sections/{section_id}/tasks"))
                .set_json(payload),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["strikesLimit"], limit);
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_task_type_is_rejected() {
        let (status, body) = send(
            MockPorts::default(),
            actix_test::TestRequest::post()
                .uri(&format!("/api/sections/{}/tasks", Uuid::new_v4()))
                .set_json(json!({"name": "Mood", "taskType": "emoji"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "taskType");
    }

    #[rstest]
    #[actix_web::test]
    async fn update_replaces_settings() {
        let task_id = Uuid::new_v4();
        let mut ports = MockPorts::default();
        ports
            .tasks
            .expect_update_task()
            .withf(move |req| req.task.task_id == task_id && req.settings.name.as_ref() == "Read")
            .returning(|req| {
                let mut task = sample_task(Uuid::new_v4(), 2);
                task.name = req.settings.name;
                Ok(task)
            });

        let (status, body) = send(
            ports,
            actix_test::TestRequest::put()
                .uri(&format!("/api/tasks/{task_id}"))
                .set_json(json!({"name": "Read", "taskType": "text"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Read");
    }

    #[rstest]
    #[actix_web::test]
    async fn list_and_delete_use_task_ports() {
        let section_id = Uuid::new_v4();
        let mut ports = MockPorts::default();
        ports
            .tasks_query
            .expect_list_tasks()
            .returning(move |_| Ok(vec![sample_task(section_id, 1)]));
        ports.tasks.expect_delete_task().times(1).returning(|_| Ok(()));
        let app = actix_test::init_service(ports.into_app()).await;

        let listed = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/sections/{section_id}/tasks"))
                .insert_header(bearer())
                .to_request(),
        )
        .await;
        assert_eq!(listed.status(), StatusCode::OK);

        let deleted = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/tasks/{}", Uuid::new_v4()))
                .insert_header(bearer())
                .to_request(),
        )
        .await;
        assert_eq!(deleted.status(), StatusCode::OK);
    }
}
