//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    ChallengeCommand, ChallengeQuery, ChallengeRepository, DayLedgerRepository, IdentityVerifier,
    LedgerCommand, LedgerQuery, MeasurementCommand, MeasurementQuery, MeasurementRepository,
    SectionCommand, SectionQuery, SectionRepository, TaskCommand, TaskQuery, TaskRepository,
};
use crate::domain::{
    ChallengeService, LedgerService, MeasurementService, SectionService, TaskService,
};

/// Repository adapters backing the domain services.
pub struct RepositoryPorts<C, S, T, L, M> {
    pub challenges: Arc<C>,
    pub sections: Arc<S>,
    pub tasks: Arc<T>,
    pub ledger: Arc<L>,
    pub measurements: Arc<M>,
}

/// Parameter object bundling the driving ports used by handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub challenges: Arc<dyn ChallengeCommand>,
    pub challenges_query: Arc<dyn ChallengeQuery>,
    pub sections: Arc<dyn SectionCommand>,
    pub sections_query: Arc<dyn SectionQuery>,
    pub tasks: Arc<dyn TaskCommand>,
    pub tasks_query: Arc<dyn TaskQuery>,
    pub ledger: Arc<dyn LedgerCommand>,
    pub ledger_query: Arc<dyn LedgerQuery>,
    pub measurements: Arc<dyn MeasurementCommand>,
    pub measurements_query: Arc<dyn MeasurementQuery>,
}

impl HttpStatePorts {
    /// Wire the domain services over `repos`.
    ///
    /// `program_length` feeds the completion rate of progress reports.
    pub fn from_repositories<C, S, T, L, M>(
        repos: RepositoryPorts<C, S, T, L, M>,
        clock: Arc<dyn Clock>,
        program_length: u32,
    ) -> Self
    where
        C: ChallengeRepository + 'static,
        S: SectionRepository + 'static,
        T: TaskRepository + 'static,
        L: DayLedgerRepository + 'static,
        M: MeasurementRepository + 'static,
    {
        let RepositoryPorts {
            challenges,
            sections,
            tasks,
            ledger,
            measurements,
        } = repos;
        let challenge_service = Arc::new(
            ChallengeService::new(Arc::clone(&challenges), Arc::clone(&clock))
                .with_program_length(program_length),
        );
        let section_service = Arc::new(SectionService::new(sections));
        let task_service = Arc::new(TaskService::new(tasks));
        let ledger_service = Arc::new(LedgerService::new(ledger, Arc::clone(&clock)));
        let measurement_service = Arc::new(MeasurementService::new(challenges, measurements, clock));

        Self {
            challenges: challenge_service.clone(),
            challenges_query: challenge_service,
            sections: section_service.clone(),
            sections_query: section_service,
            tasks: task_service.clone(),
            tasks_query: task_service,
            ledger: ledger_service.clone(),
            ledger_query: ledger_service,
            measurements: measurement_service.clone(),
            measurements_query: measurement_service,
        }
    }
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub challenges: Arc<dyn ChallengeCommand>,
    pub challenges_query: Arc<dyn ChallengeQuery>,
    pub sections: Arc<dyn SectionCommand>,
    pub sections_query: Arc<dyn SectionQuery>,
    pub tasks: Arc<dyn TaskCommand>,
    pub tasks_query: Arc<dyn TaskQuery>,
    pub ledger: Arc<dyn LedgerCommand>,
    pub ledger_query: Arc<dyn LedgerQuery>,
    pub measurements: Arc<dyn MeasurementCommand>,
    pub measurements_query: Arc<dyn MeasurementQuery>,
    /// Resolves bearer tokens for the [`super::identity::CallerIdentity`]
    /// extractor.
    pub identity: Arc<dyn IdentityVerifier>,
}

impl HttpState {
    /// Construct state from the driving ports and an identity verifier.
    pub fn new(ports: HttpStatePorts, identity: Arc<dyn IdentityVerifier>) -> Self {
        let HttpStatePorts {
            challenges,
            challenges_query,
            sections,
            sections_query,
            tasks,
            tasks_query,
            ledger,
            ledger_query,
            measurements,
            measurements_query,
        } = ports;
        Self {
            challenges,
            challenges_query,
            sections,
            sections_query,
            tasks,
            tasks_query,
            ledger,
            ledger_query,
            measurements,
            measurements_query,
            identity,
        }
    }
}
