//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every `/api` handler plus the health probes
//! - **Schemas**: request and response bodies, and wrappers
//!   ([`ErrorSchema`], [`ErrorCodeSchema`]) that document domain types
//!   without coupling them to utoipa
//! - **Security**: bearer token authentication scheme
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::challenges::{
    ChallengeBody, CreateChallengeBody, ProgressBody, UpdateChallengeBody,
};
use crate::inbound::http::entries::{
    DayEntryBody, DayRecordBody, DaySubmissionBody, TaskRecordBody, TaskRecordInput,
    UpsertDayBody,
};
use crate::inbound::http::envelope::Acknowledgement;
use crate::inbound::http::measurements::{MeasurementBody, MeasurementInput};
use crate::inbound::http::schemas::{
    ChallengeStatusSchema, ErrorCodeSchema, ErrorSchema, TaskTypeSchema,
};
use crate::inbound::http::sections::{
    CreateSectionBody, MoveBody, SectionBody, UpdateSectionBody,
};
use crate::inbound::http::tasks::{CreateTaskBody, TaskBody, TaskSettingsBody};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("HS256 token whose `sub` claim identifies the caller."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "hardinfinity API",
        description = "Multi-day challenge tracking: challenges, ordered sections and tasks, the day ledger, streak progress and body measurements."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::challenges::list_challenges,
        crate::inbound::http::challenges::create_challenge,
        crate::inbound::http::challenges::get_challenge,
        crate::inbound::http::challenges::update_challenge,
        crate::inbound::http::challenges::delete_challenge,
        crate::inbound::http::challenges::reset_challenge,
        crate::inbound::http::challenges::challenge_progress,
        crate::inbound::http::sections::list_sections,
        crate::inbound::http::sections::create_section,
        crate::inbound::http::sections::update_section,
        crate::inbound::http::sections::move_section,
        crate::inbound::http::sections::delete_section,
        crate::inbound::http::tasks::list_tasks,
        crate::inbound::http::tasks::create_task,
        crate::inbound::http::tasks::update_task,
        crate::inbound::http::tasks::move_task,
        crate::inbound::http::tasks::delete_task,
        crate::inbound::http::entries::list_entries,
        crate::inbound::http::entries::upsert_today,
        crate::inbound::http::entries::get_entry,
        crate::inbound::http::entries::upsert_entry,
        crate::inbound::http::measurements::list_measurements,
        crate::inbound::http::measurements::add_measurement,
        crate::inbound::http::measurements::update_measurement,
        crate::inbound::http::measurements::delete_measurement,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        ChallengeStatusSchema,
        TaskTypeSchema,
        Acknowledgement,
        CreateChallengeBody,
        UpdateChallengeBody,
        ChallengeBody,
        ProgressBody,
        CreateSectionBody,
        UpdateSectionBody,
        MoveBody,
        SectionBody,
        TaskSettingsBody,
        CreateTaskBody,
        TaskBody,
        TaskRecordInput,
        DaySubmissionBody,
        DayRecordBody,
        TaskRecordBody,
        DayEntryBody,
        UpsertDayBody,
        MeasurementInput,
        MeasurementBody,
    )),
    tags(
        (name = "challenges", description = "Challenge lifecycle and progress"),
        (name = "sections", description = "Ordered sections of a challenge"),
        (name = "tasks", description = "Ordered tasks of a section"),
        (name = "entries", description = "The per-day ledger"),
        (name = "measurements", description = "Body measurements"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated OpenAPI document.

    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // Note: utoipa replaces :: with . in schema names
    const ERROR_CODE_SCHEMA_NAME: &str = "crate.domain.ErrorCode";
    const ERROR_SCHEMA_NAME: &str = "ErrorEnvelope";

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    fn error_envelope_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("error schema");

        for field in ["success", "error", "code", "traceId"] {
            assert_object_schema_has_field(error_schema, field);
        }
        assert!(schemas.contains_key(ERROR_CODE_SCHEMA_NAME));
    }

    #[rstest]
    #[case("/api/challenges")]
    #[case("/api/challenges/{id}/reset")]
    #[case("/api/challenges/{id}/progress")]
    #[case("/api/sections/{id}/order")]
    #[case("/api/tasks/{id}/order")]
    #[case("/api/challenges/{id}/entries/{day}")]
    #[case("/api/measurements/{id}")]
    #[case("/health/ready")]
    fn document_lists_route(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
    }
}
