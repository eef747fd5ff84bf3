//! HS256 JWT verification for bearer credentials.
//!
//! Tokens must carry a `sub` claim (the opaque user id) and an `exp` claim.
//! The signing secret comes from configuration and must be at least
//! [`MIN_SECRET_LEN`] bytes long.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::debug;

use crate::domain::ports::IdentityVerifier;
use crate::domain::{Error, UserId};

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Fixed secret accepted only when insecure development tokens are enabled.
pub const DEV_SECRET: &str = "hardinfinity-dev-secret-not-for-production";

/// Rejected verifier configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityConfigError {
    #[error("jwt secret is required")]
    MissingSecret,
    #[error("jwt secret must be at least {MIN_SECRET_LEN} bytes")]
    SecretTooShort,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// [`IdentityVerifier`] validating HS256-signed JWTs.
#[derive(Clone)]
pub struct JwtIdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    /// Build a verifier for `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityConfigError`] when the secret is empty or shorter
    /// than [`MIN_SECRET_LEN`].
    pub fn new(secret: &str) -> Result<Self, IdentityConfigError> {
        if secret.is_empty() {
            return Err(IdentityConfigError::MissingSecret);
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(IdentityConfigError::SecretTooShort);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Verifier keyed with [`DEV_SECRET`].
    pub fn development() -> Self {
        Self {
            key: DecodingKey::from_secret(DEV_SECRET.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, Error> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|err| {
            debug!(kind = ?err.kind(), "bearer token rejected");
            let reason = match err.kind() {
                ErrorKind::ExpiredSignature => "token expired",
                ErrorKind::InvalidSignature => "invalid token signature",
                _ => "invalid token",
            };
            Error::unauthorized(reason)
        })?;
        UserId::new(data.claims.sub)
            .map_err(|err| Error::unauthorized(format!("invalid token subject: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;
    use crate::domain::ErrorCode;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn sign(secret: &str, claims: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("token encodes")
    }

    fn in_an_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[fixture]
    fn verifier() -> JwtIdentityVerifier {
        JwtIdentityVerifier::new(SECRET).expect("valid secret")
    }

    #[rstest]
    #[tokio::test]
    async fn subject_becomes_the_user_id(verifier: JwtIdentityVerifier) {
        let token = sign(SECRET, json!({ "sub": "user_7", "exp": in_an_hour() }));

        let user = verifier.verify(&token).await.expect("token accepted");

        assert_eq!(user.as_ref(), "user_7");
    }

    #[rstest]
    #[case::wrong_secret(sign("ffffffffffffffffffffffffffffffff", json!({ "sub": "u", "exp": in_an_hour() })))]
    #[case::expired(sign(SECRET, json!({ "sub": "u", "exp": 1_000 })))]
    #[case::missing_subject(sign(SECRET, json!({ "exp": in_an_hour() })))]
    #[case::blank_subject(sign(SECRET, json!({ "sub": "", "exp": in_an_hour() })))]
    #[case::garbage("not.a.jwt".to_owned())]
    #[tokio::test]
    async fn invalid_tokens_are_unauthorized(verifier: JwtIdentityVerifier, #[case] token: String) {
        let err = verifier.verify(&token).await.expect_err("token rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    #[case("", IdentityConfigError::MissingSecret)]
    #[case("short", IdentityConfigError::SecretTooShort)]
    fn weak_secrets_are_refused(#[case] secret: &str, #[case] expected: IdentityConfigError) {
        assert_eq!(JwtIdentityVerifier::new(secret).err(), Some(expected));
    }

    #[rstest]
    #[tokio::test]
    async fn development_verifier_accepts_dev_tokens() {
        let token = sign(DEV_SECRET, json!({ "sub": "dev", "exp": in_an_hour() }));
        let user = JwtIdentityVerifier::development()
            .verify(&token)
            .await
            .expect("dev token accepted");
        assert_eq!(user.as_ref(), "dev");
    }
}
