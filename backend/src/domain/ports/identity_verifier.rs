//! Driven port for bearer credential verification.
//!
//! Inbound adapters hand the raw bearer token to an [`IdentityVerifier`] and
//! receive the caller's [`UserId`]. The domain never inspects credentials
//! itself.

use async_trait::async_trait;

use crate::domain::{Error, UserId};

/// Resolves a bearer credential to a stable user identifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `token` and return the subject it was issued to.
    ///
    /// Implementations return [`Error::unauthorized`] for any credential they
    /// cannot validate.
    async fn verify(&self, token: &str) -> Result<UserId, Error>;
}

/// Verifier that treats the token itself as the user id.
///
/// Only suitable for tests and local runs: any well-formed id is accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityVerifier;

#[async_trait]
impl IdentityVerifier for FixtureIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, Error> {
        UserId::new(token).map_err(|err| Error::unauthorized(format!("invalid token: {err}")))
    }
}
