//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::domain::ports::{
    FixtureIdentityVerifier, MockChallengeCommand, MockChallengeQuery, MockLedgerCommand,
    MockLedgerQuery, MockMeasurementCommand, MockMeasurementQuery, MockSectionCommand,
    MockSectionQuery, MockTaskCommand, MockTaskQuery,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Owner id accepted by the fixture identity verifier.
pub const OWNER: &str = "owner_1";

/// `Authorization` header value authenticating as [`OWNER`].
pub fn bearer() -> (&'static str, String) {
    ("Authorization", format!("Bearer {OWNER}"))
}

/// Mock driving ports; set expectations on the fields a test needs and leave
/// the rest untouched.
#[derive(Default)]
pub struct MockPorts {
    pub challenges: MockChallengeCommand,
    pub challenges_query: MockChallengeQuery,
    pub sections: MockSectionCommand,
    pub sections_query: MockSectionQuery,
    pub tasks: MockTaskCommand,
    pub tasks_query: MockTaskQuery,
    pub ledger: MockLedgerCommand,
    pub ledger_query: MockLedgerQuery,
    pub measurements: MockMeasurementCommand,
    pub measurements_query: MockMeasurementQuery,
}

impl MockPorts {
    /// Build handler state using [`FixtureIdentityVerifier`].
    pub fn into_state(self) -> HttpState {
        HttpState::new(
            HttpStatePorts {
                challenges: Arc::new(self.challenges),
                challenges_query: Arc::new(self.challenges_query),
                sections: Arc::new(self.sections),
                sections_query: Arc::new(self.sections_query),
                tasks: Arc::new(self.tasks),
                tasks_query: Arc::new(self.tasks_query),
                ledger: Arc::new(self.ledger),
                ledger_query: Arc::new(self.ledger_query),
                measurements: Arc::new(self.measurements),
                measurements_query: Arc::new(self.measurements_query),
            },
            Arc::new(FixtureIdentityVerifier),
        )
    }

    /// App with the full `/api` surface wired to these mocks.
    pub fn into_app(
        self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.into_state()))
            .configure(super::configure_extractors)
            .service(web::scope("/api").configure(super::configure_api))
    }
}
