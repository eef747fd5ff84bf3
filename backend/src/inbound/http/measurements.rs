//! Body measurement HTTP handlers.
//!
//! ```text
//! GET    /api/challenges/{id}/measurements
//! POST   /api/challenges/{id}/measurements
//! PUT    /api/measurements/{id}
//! DELETE /api/measurements/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{AddMeasurementRequest, MeasurementRef, UpdateMeasurementRequest};
use crate::domain::{BodyMetrics, Error, Measurement, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::challenges::challenge_ref;
use crate::inbound::http::envelope::{Acknowledgement, ApiEnvelope};
use crate::inbound::http::identity::CallerIdentity;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_metrics, parse_optional_day_number, parse_optional_timestamp, parse_uuid,
};

/// Measurement payload for add and update. Missing metrics are zero.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementInput {
    /// Defaults to the challenge's current day (add) or the stored day
    /// (update) when omitted or non-positive.
    pub day_number: Option<i64>,
    /// Defaults to now (add) or the stored date (update).
    #[schema(format = "date-time")]
    pub date: Option<String>,
    pub weight: Option<f64>,
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub arms: Option<f64>,
    pub thighs: Option<f64>,
}

impl MeasurementInput {
    fn metrics(&self) -> Result<BodyMetrics, Error> {
        parse_metrics([
            self.weight,
            self.chest,
            self.waist,
            self.hips,
            self.arms,
            self.thighs,
        ])
    }
}

/// Measurement as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "uuid")]
    pub challenge_id: String,
    pub day_number: u32,
    #[schema(format = "date-time")]
    pub date: String,
    pub weight: f64,
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub arms: f64,
    pub thighs: f64,
    #[schema(format = "date-time")]
    pub created_at: String,
    #[schema(format = "date-time")]
    pub updated_at: String,
}

impl From<Measurement> for MeasurementBody {
    fn from(value: Measurement) -> Self {
        let BodyMetrics {
            weight,
            chest,
            waist,
            hips,
            arms,
            thighs,
        } = value.metrics;
        Self {
            id: value.id.to_string(),
            challenge_id: value.challenge_id.to_string(),
            day_number: value.day_number,
            date: value.date.to_rfc3339(),
            weight,
            chest,
            waist,
            hips,
            arms,
            thighs,
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

fn measurement_ref(owner: UserId, raw_id: String) -> Result<MeasurementRef, Error> {
    Ok(MeasurementRef {
        owner,
        measurement_id: parse_uuid(raw_id, FieldName::new("measurementId"))?,
    })
}

#[utoipa::path(
    get,
    path = "/api/challenges/{id}/measurements",
    params(("id" = String, Path, format = "uuid", description = "Challenge identifier")),
    responses(
        (status = 200, description = "Measurements by ascending day", body = ApiEnvelope<Vec<MeasurementBody>>),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Challenge not found", body = ErrorSchema)
    ),
    tags = ["measurements"],
    operation_id = "listMeasurements",
    security(("BearerAuth" = []))
)]
#[get("/challenges/{id}/measurements")]
pub async fn list_measurements(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApiEnvelope<Vec<MeasurementBody>>>> {
    let challenge = challenge_ref(caller.into_user_id(), path.into_inner())?;
    let measurements = state.measurements_query.list_measurements(challenge).await?;
    Ok(ApiEnvelope::ok(
        measurements.into_iter().map(MeasurementBody::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/challenges/{id}/measurements",
    params(("id" = String, Path, format = "uuid", description = "Challenge identifier")),
    request_body = MeasurementInput,
    responses(
        (status = 201, description = "Measurement recorded", body = ApiEnvelope<MeasurementBody>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Challenge not found", body = ErrorSchema)
    ),
    tags = ["measurements"],
    operation_id = "addMeasurement",
    security(("BearerAuth" = []))
)]
#[post("/challenges/{id}/measurements")]
pub async fn add_measurement(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<MeasurementInput>,
) -> ApiResult<HttpResponse> {
    let challenge = challenge_ref(caller.into_user_id(), path.into_inner())?;
    let body = payload.into_inner();
    let request = AddMeasurementRequest {
        challenge,
        metrics: body.metrics()?,
        day_number: parse_optional_day_number(body.day_number, FieldName::new("dayNumber"))?,
        date: parse_optional_timestamp(body.date, FieldName::new("date"))?,
    };
    let measurement = state.measurements.add_measurement(request).await?;
    Ok(ApiEnvelope::created(MeasurementBody::from(measurement)))
}

#[utoipa::path(
    put,
    path = "/api/measurements/{id}",
    params(("id" = String, Path, format = "uuid", description = "Measurement identifier")),
    request_body = MeasurementInput,
    responses(
        (status = 200, description = "Updated measurement", body = ApiEnvelope<MeasurementBody>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["measurements"],
    operation_id = "updateMeasurement",
    security(("BearerAuth" = []))
)]
#[put("/measurements/{id}")]
pub async fn update_measurement(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
    payload: web::Json<MeasurementInput>,
) -> ApiResult<web::Json<ApiEnvelope<MeasurementBody>>> {
    let measurement = measurement_ref(caller.into_user_id(), path.into_inner())?;
    let body = payload.into_inner();
    let request = UpdateMeasurementRequest {
        measurement,
        metrics: body.metrics()?,
        day_number: parse_optional_day_number(body.day_number, FieldName::new("dayNumber"))?,
        date: parse_optional_timestamp(body.date, FieldName::new("date"))?,
    };
    let updated = state.measurements.update_measurement(request).await?;
    Ok(ApiEnvelope::ok(MeasurementBody::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/api/measurements/{id}",
    params(("id" = String, Path, format = "uuid", description = "Measurement identifier")),
    responses(
        (status = 200, description = "Measurement deleted", body = Acknowledgement),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["measurements"],
    operation_id = "deleteMeasurement",
    security(("BearerAuth" = []))
)]
#[delete("/measurements/{id}")]
pub async fn delete_measurement(
    state: web::Data<HttpState>,
    caller: CallerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<Acknowledgement>> {
    let measurement = measurement_ref(caller.into_user_id(), path.into_inner())?;
    state.measurements.delete_measurement(measurement).await?;
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
    use crate::domain::service_test_support::fixture_timestamp;
    use crate::inbound::http::test_utils::{MockPorts, bearer};

    fn measurement(challenge_id: Uuid, day_number: u32, metrics: BodyMetrics) -> Measurement {
        let now = fixture_timestamp();
        Measurement {
            id: Uuid::new_v4(),
            challenge_id,
            day_number,
            date: now,
            metrics,
            created_at: now,
            updated_at: now,
        }
    }

    async fn send(ports: MockPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
        let app = actix_test::init_service(ports.into_app()).await;
        let res =
            actix_test::call_service(&app, request.insert_header(bearer()).to_request()).await;
        let status = res.status();
        (status, actix_test::read_body_json(res).await)
    }

    #[rstest]
    #[case(json!({"weight": 82.5}), None)]
    #[case(json!({"weight": 82.5, "dayNumber": 0}), None)]
    #[case(json!({"weight": 82.5, "dayNumber": 9}), Some(9))]
    #[actix_web::test]
    async fn add_defers_day_when_not_positive(#[case] payload: Value, #[case] day: Option<u32>) {
        let mut ports = MockPorts::default();
        ports
            .measurements
            .expect_add_measurement()
            .withf(move |req| {
                req.day_number == day && req.date.is_none() && req.metrics.weight == 82.5
            })
            .times(1)
            .returning(|req| {
                Ok(measurement(
                    req.challenge.challenge_id,
                    req.day_number.unwrap_or(4),
                    req.metrics,
                ))
            });

        let (status, body) = send(
            ports,
            actix_test::TestRequest::post()
                .uri(&format!("/api/challenges/{}/measurements", Uuid::new_v4()))
                .set_json(payload),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["weight"], 82.5);
        assert_eq!(body["data"]["chest"], 0.0);
    }

    #[rstest]
    #[actix_web::test]
    async fn negative_metric_is_rejected() {
        let (status, body) = send(
            MockPorts::default(),
            actix_test::TestRequest::post()
                .uri(&format!("/api/challenges/{}/measurements", Uuid::new_v4()))
                .set_json(json!({"hips": -3.0})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "hips");
    }

    #[rstest]
    #[actix_web::test]
    async fn update_and_delete_address_measurement_by_id() {
        let measurement_id = Uuid::new_v4();
        let mut ports = MockPorts::default();
        ports
            .measurements
            .expect_update_measurement()
            .withf(move |req| {
                req.measurement.measurement_id == measurement_id && req.metrics.arms == 36.0
            })
            .returning(|req| Ok(measurement(Uuid::new_v4(), 3, req.metrics)));
        ports
            .measurements
            .expect_delete_measurement()
            .withf(move |target| target.measurement_id == measurement_id)
            .returning(|_| Ok(()));
        let app = actix_test::init_service(ports.into_app()).await;

        let updated = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/measurements/{measurement_id}"))
                .insert_header(bearer())
                .set_json(json!({"arms": 36.0}))
                .to_request(),
        )
        .await;
        assert_eq!(updated.status(), StatusCode::OK);

        let deleted = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri(&format!("/api/measurements/{measurement_id}"))
                .insert_header(bearer())
                .to_request(),
        )
        .await;
        assert_eq!(deleted.status(), StatusCode::OK);
    }

    #[rstest]
    #[actix_web::test]
    async fn list_returns_measurements() {
        let challenge_id = Uuid::new_v4();
        let mut ports = MockPorts::default();
        ports
            .measurements_query
            .expect_list_measurements()
            .returning(move |_| Ok(vec![measurement(challenge_id, 1, BodyMetrics::default())]));

        let (status, body) = send(
            ports,
            actix_test::TestRequest::get()
                .uri(&format!("/api/challenges/{challenge_id}/measurements")),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["dayNumber"], 1);
    }
}
