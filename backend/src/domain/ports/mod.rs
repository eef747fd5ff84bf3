//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`IdentityVerifier`]) are implemented by
//! outbound adapters. Driving ports (`*Command`, `*Query`) are implemented by
//! the domain services and called by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;
pub use macros::RepositoryFailure;

mod challenge_command;
mod challenge_query;
mod challenge_repository;
mod day_ledger_repository;
mod identity_verifier;
mod ledger_command;
mod measurement_command;
mod measurement_repository;
mod section_command;
mod section_repository;
mod task_command;
mod task_repository;

#[cfg(test)]
pub use challenge_command::MockChallengeCommand;
pub use challenge_command::{
    ChallengeCommand, ChallengeRef, CreateChallengeRequest, UpdateChallengeRequest,
};
#[cfg(test)]
pub use challenge_query::MockChallengeQuery;
pub use challenge_query::{ChallengeProgress, ChallengeQuery};
#[cfg(test)]
pub use challenge_repository::MockChallengeRepository;
pub use challenge_repository::{ChallengeRepository, ChallengeRepositoryError};
#[cfg(test)]
pub use day_ledger_repository::MockDayLedgerRepository;
pub use day_ledger_repository::{DayLedgerRepository, DayLedgerRepositoryError};
#[cfg(test)]
pub use identity_verifier::MockIdentityVerifier;
pub use identity_verifier::{FixtureIdentityVerifier, IdentityVerifier};
#[cfg(test)]
pub use ledger_command::{MockLedgerCommand, MockLedgerQuery};
pub use ledger_command::{DayRef, LedgerCommand, LedgerQuery, UpsertDayRequest, UpsertDayResponse};
#[cfg(test)]
pub use measurement_command::{MockMeasurementCommand, MockMeasurementQuery};
pub use measurement_command::{
    AddMeasurementRequest, MeasurementCommand, MeasurementQuery, MeasurementRef,
    UpdateMeasurementRequest,
};
#[cfg(test)]
pub use measurement_repository::MockMeasurementRepository;
pub use measurement_repository::{MeasurementRepository, MeasurementRepositoryError};
#[cfg(test)]
pub use section_command::{MockSectionCommand, MockSectionQuery};
pub use section_command::{
    CreateSectionRequest, MoveSectionRequest, SectionCommand, SectionQuery, SectionRef,
    UpdateSectionRequest,
};
#[cfg(test)]
pub use section_repository::MockSectionRepository;
pub use section_repository::{SectionRepository, SectionRepositoryError};
#[cfg(test)]
pub use task_command::{MockTaskCommand, MockTaskQuery};
pub use task_command::{
    CreateTaskRequest, MoveTaskRequest, TaskCommand, TaskQuery, TaskRef, UpdateTaskRequest,
};
#[cfg(test)]
pub use task_repository::MockTaskRepository;
pub use task_repository::{TaskRepository, TaskRepositoryError};
