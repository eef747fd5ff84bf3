//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for unit tests and when the `test-support` feature is enabled.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use mockable::DefaultClock;

use crate::Trace;
use crate::domain::DEFAULT_PROGRAM_LENGTH;
use crate::domain::ports::FixtureIdentityVerifier;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::state::{HttpState, HttpStatePorts, RepositoryPorts};
use crate::inbound::http::{configure_api, configure_extractors};

pub use crate::outbound::memory::{InMemoryStore, TableCounts};

/// `Authorization` header authenticating as `user` under
/// [`FixtureIdentityVerifier`], which treats the token as the user id.
///
/// # Examples
///
/// ```rust
/// use hardinfinity::test_support::bearer;
///
/// assert_eq!(bearer("user_1"), ("Authorization", "Bearer user_1".to_owned()));
/// ```
pub fn bearer(user: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {user}"))
}

/// Handler state with every service backed by `store`.
pub fn memory_http_state(store: &InMemoryStore) -> HttpState {
    let store = Arc::new(store.clone());
    let ports = HttpStatePorts::from_repositories(
        RepositoryPorts {
            challenges: Arc::clone(&store),
            sections: Arc::clone(&store),
            tasks: Arc::clone(&store),
            ledger: Arc::clone(&store),
            measurements: store,
        },
        Arc::new(DefaultClock),
        DEFAULT_PROGRAM_LENGTH,
    );
    HttpState::new(ports, Arc::new(FixtureIdentityVerifier))
}

/// Full application over `store`: trace middleware, `/api` routes and the
/// health probes.
pub fn memory_app(
    store: &InMemoryStore,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let health = web::Data::new(HealthState::new());
    health.mark_ready();
    App::new()
        .app_data(web::Data::new(memory_http_state(store)))
        .app_data(health)
        .wrap(Trace)
        .configure(configure_extractors)
        .service(web::scope("/api").configure(configure_api))
        .service(ready)
        .service(live)
}
