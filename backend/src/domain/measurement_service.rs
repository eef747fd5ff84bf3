//! Measurement domain service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use uuid::Uuid;

use crate::domain::challenge_service::challenge_not_found;
use crate::domain::ports::{
    AddMeasurementRequest, ChallengeRef, ChallengeRepository, ChallengeRepositoryError,
    MeasurementCommand, MeasurementQuery, MeasurementRef, MeasurementRepository,
    MeasurementRepositoryError, UpdateMeasurementRequest,
};
use crate::domain::{Error, Measurement, MeasurementChanges, MeasurementDraft};

fn map_repository_error(error: MeasurementRepositoryError) -> Error {
    match error {
        MeasurementRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("measurement repository unavailable: {message}"))
        }
        MeasurementRepositoryError::Query { message } => {
            Error::internal(format!("measurement repository error: {message}"))
        }
        MeasurementRepositoryError::ChallengeNotFound { challenge_id } => {
            challenge_not_found(challenge_id)
        }
        MeasurementRepositoryError::NotFound { measurement_id } => {
            measurement_not_found(measurement_id)
        }
    }
}

fn map_challenge_error(error: ChallengeRepositoryError) -> Error {
    match error {
        ChallengeRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("challenge repository unavailable: {message}"))
        }
        ChallengeRepositoryError::Query { message } => {
            Error::internal(format!("challenge repository error: {message}"))
        }
        ChallengeRepositoryError::NotFound { challenge_id } => challenge_not_found(challenge_id),
    }
}

fn measurement_not_found(measurement_id: Uuid) -> Error {
    Error::not_found(format!("measurement {measurement_id} not found"))
}

/// Measurement service implementing the command and query driving ports.
///
/// The challenge repository supplies the current day used when a
/// measurement does not name one.
#[derive(Clone)]
pub struct MeasurementService<C, M> {
    challenge_repo: Arc<C>,
    measurement_repo: Arc<M>,
    clock: Arc<dyn Clock>,
}

impl<C, M> MeasurementService<C, M> {
    pub fn new(challenge_repo: Arc<C>, measurement_repo: Arc<M>, clock: Arc<dyn Clock>) -> Self {
        Self {
            challenge_repo,
            measurement_repo,
            clock,
        }
    }
}

#[async_trait]
impl<C, M> MeasurementCommand for MeasurementService<C, M>
where
    C: ChallengeRepository,
    M: MeasurementRepository,
{
    async fn add_measurement(&self, request: AddMeasurementRequest) -> Result<Measurement, Error> {
        let owner = &request.challenge.owner;
        let challenge_id = request.challenge.challenge_id;
        let challenge = self
            .challenge_repo
            .find_for_owner(owner, challenge_id)
            .await
            .map_err(map_challenge_error)?
            .ok_or_else(|| challenge_not_found(challenge_id))?;

        let draft = MeasurementDraft {
            id: Uuid::new_v4(),
            challenge_id,
            day_number: request
                .day_number
                .filter(|day| *day > 0)
                .unwrap_or(challenge.current_day),
            date: request.date.unwrap_or_else(|| self.clock.utc()),
            metrics: request.metrics,
        };
        self.measurement_repo
            .create(owner, &draft)
            .await
            .map_err(map_repository_error)
    }

    async fn update_measurement(
        &self,
        request: UpdateMeasurementRequest,
    ) -> Result<Measurement, Error> {
        let target = &request.measurement;
        let existing = self
            .measurement_repo
            .find_for_owner(&target.owner, target.measurement_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| measurement_not_found(target.measurement_id))?;

        let changes = MeasurementChanges {
            day_number: request
                .day_number
                .filter(|day| *day > 0)
                .unwrap_or(existing.day_number),
            date: request.date.unwrap_or(existing.date),
            metrics: request.metrics,
        };
        self.measurement_repo
            .update(&target.owner, target.measurement_id, &changes)
            .await
            .map_err(map_repository_error)
    }

    async fn delete_measurement(&self, measurement: MeasurementRef) -> Result<(), Error> {
        self.measurement_repo
            .delete(&measurement.owner, measurement.measurement_id)
            .await
            .map_err(map_repository_error)
    }
}

#[async_trait]
impl<C, M> MeasurementQuery for MeasurementService<C, M>
where
    C: ChallengeRepository,
    M: MeasurementRepository,
{
    async fn list_measurements(&self, challenge: ChallengeRef) -> Result<Vec<Measurement>, Error> {
        self.measurement_repo
            .list(&challenge.owner, challenge.challenge_id)
            .await
            .map_err(map_repository_error)
    }
}
