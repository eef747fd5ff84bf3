//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror their wire shape so the generated document matches
//! what handlers actually emit.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Bearer credential missing or rejected.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The resource does not exist or is not owned by the caller.
    #[schema(rename = "not_found")]
    NotFound,
    /// The resource is in a state that refuses the operation.
    #[schema(rename = "conflict")]
    Conflict,
    /// Storage is temporarily unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`super::error::ErrorEnvelope`].
#[derive(ToSchema)]
#[schema(as = ErrorEnvelope)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Always `false` for failures.
    #[schema(example = false)]
    success: bool,
    /// Human-readable message returned to clients.
    #[schema(example = "challenge not found")]
    error: String,
    #[schema(example = "not_found")]
    code: ErrorCodeSchema,
    /// Correlation identifier, also sent as the `trace-id` header.
    #[schema(rename = "traceId", example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Field-level context for validation failures.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::ChallengeStatus`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ChallengeStatus)]
pub enum ChallengeStatusSchema {
    #[schema(rename = "active")]
    Active,
    #[schema(rename = "completed")]
    Completed,
    #[schema(rename = "failed")]
    Failed,
}

/// OpenAPI schema for [`crate::domain::TaskType`].
#[derive(ToSchema)]
#[schema(as = crate::domain::TaskType)]
pub enum TaskTypeSchema {
    #[schema(rename = "boolean")]
    Boolean,
    #[schema(rename = "number")]
    Number,
    #[schema(rename = "text")]
    Text,
}

#[cfg(test)]
mod tests {
    use utoipa::PartialSchema;

    use super::*;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[test]
    fn error_code_schema_lists_every_code() {
        let schema_json = schema_to_json::<ErrorCodeSchema>();
        assert_eq!(ErrorCodeSchema::name(), "crate.domain.ErrorCode");
        for code in [
            "invalid_request",
            "unauthorized",
            "forbidden",
            "not_found",
            "conflict",
            "service_unavailable",
            "internal_error",
        ] {
            assert!(schema_json.contains(code), "missing {code}");
        }
    }

    #[test]
    fn error_schema_matches_envelope_keys() {
        let schema_json = schema_to_json::<ErrorSchema>();
        assert_eq!(ErrorSchema::name(), "ErrorEnvelope");
        for key in ["success", "error", "code", "traceId", "details"] {
            assert!(schema_json.contains(key), "missing {key}");
        }
    }

    #[test]
    fn enum_schemas_use_wire_names() {
        assert!(schema_to_json::<ChallengeStatusSchema>().contains("completed"));
        assert!(schema_to_json::<TaskTypeSchema>().contains("number"));
    }
}
