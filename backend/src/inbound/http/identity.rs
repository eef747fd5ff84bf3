//! Caller identity extraction from bearer credentials.
//!
//! Handlers take a [`CallerIdentity`] argument; the extractor reads
//! `Authorization: Bearer <token>` and resolves it through the configured
//! [`crate::domain::ports::IdentityVerifier`]. Any failure is `401`.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{Error, UserId};
use crate::inbound::http::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated caller of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(UserId);

impl CallerIdentity {
    pub fn user_id(&self) -> &UserId {
        &self.0
    }

    pub fn into_user_id(self) -> UserId {
        self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| Error::unauthorized("malformed authorization header"))
}

impl FromRequest for CallerIdentity {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let verifier = req
            .app_data::<web::Data<HttpState>>()
            .map(|state| state.identity.clone());
        Box::pin(async move {
            let verifier =
                verifier.ok_or_else(|| Error::internal("identity verifier is not configured"))?;
            let token = token?;
            let user = verifier.verify(&token).await.inspect_err(|err| {
                debug!(message = err.message(), "bearer token rejected");
            })?;
            Ok::<_, actix_web::Error>(CallerIdentity(user))
        })
    }
}
