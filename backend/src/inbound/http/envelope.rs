//! Uniform success envelope for JSON responses.
//!
//! Every successful response is `{ "success": true, "data": ... }`; deletes
//! answer with a bare `{ "success": true }` acknowledgement. Failures use
//! [`super::error::ErrorEnvelope`].

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Success payload wrapping the response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }

    /// 200 OK with the enveloped body.
    pub fn ok(data: T) -> web::Json<Self> {
        web::Json(Self::new(data))
    }

    /// 201 Created with the enveloped body.
    pub fn created(data: T) -> HttpResponse {
        HttpResponse::Created().json(Self::new(data))
    }
}

/// Body-less success, returned by deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Acknowledgement {
    pub success: bool,
}

impl Acknowledgement {
    pub fn ok() -> web::Json<Self> {
        web::Json(Self { success: true })
    }
}
