//! Builders for the identity verifier and repository-backed HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};
use tracing::warn;

use hardinfinity::domain::ports::IdentityVerifier;
use hardinfinity::inbound::http::state::{HttpState, HttpStatePorts, RepositoryPorts};
use hardinfinity::outbound::identity::{IdentityConfigError, JwtIdentityVerifier};
use hardinfinity::outbound::memory::InMemoryStore;
use hardinfinity::outbound::persistence::{
    DieselChallengeRepository, DieselDayLedgerRepository, DieselMeasurementRepository,
    DieselSectionRepository, DieselTaskRepository,
};

use super::ServerConfig;

/// Select the bearer verifier.
///
/// A configured secret always wins. Without one, debug builds may opt into
/// the fixed development secret; everything else is a configuration error.
pub(crate) fn build_identity(
    jwt_secret: Option<&str>,
    allow_insecure_dev_tokens: bool,
) -> Result<Arc<dyn IdentityVerifier>, IdentityConfigError> {
    match jwt_secret {
        Some(secret) => Ok(Arc::new(JwtIdentityVerifier::new(secret)?)),
        None if allow_insecure_dev_tokens && cfg!(debug_assertions) => {
            warn!("accepting tokens signed with the development secret");
            Ok(Arc::new(JwtIdentityVerifier::development()))
        }
        None => Err(IdentityConfigError::MissingSecret),
    }
}

/// Build the shared HTTP state from the Diesel adapters, or from the
/// in-memory store when no pool is configured.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let ports = match &config.db_pool {
        Some(pool) => HttpStatePorts::from_repositories(
            RepositoryPorts {
                challenges: Arc::new(DieselChallengeRepository::new(pool.clone())),
                sections: Arc::new(DieselSectionRepository::new(pool.clone())),
                tasks: Arc::new(DieselTaskRepository::new(pool.clone())),
                ledger: Arc::new(DieselDayLedgerRepository::new(pool.clone())),
                measurements: Arc::new(DieselMeasurementRepository::new(pool.clone())),
            },
            clock,
            config.program_length,
        ),
        None => {
            warn!("no database configured; data lives in memory and is lost on exit");
            let store = Arc::new(InMemoryStore::new());
            HttpStatePorts::from_repositories(
                RepositoryPorts {
                    challenges: Arc::clone(&store),
                    sections: Arc::clone(&store),
                    tasks: Arc::clone(&store),
                    ledger: Arc::clone(&store),
                    measurements: store,
                },
                clock,
                config.program_length,
            )
        }
    };
    web::Data::new(HttpState::new(ports, Arc::clone(&config.identity)))
}
