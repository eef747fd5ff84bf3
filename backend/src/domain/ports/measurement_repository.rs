//! Port for body measurement persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Measurement, MeasurementChanges, MeasurementDraft, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by measurement repository adapters.
    pub enum MeasurementRepositoryError for "measurement repository" {
        /// The challenge is missing or not owned by the caller.
        ChallengeNotFound { challenge_id: Uuid } =>
            "challenge {challenge_id} not found",
        /// The measurement is missing or not owned by the caller.
        NotFound { measurement_id: Uuid } =>
            "measurement {measurement_id} not found",
    }
}

/// Port for measurement storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeasurementRepository: Send + Sync {
    /// Measurements of an owned challenge, ascending by day number.
    async fn list(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Vec<Measurement>, MeasurementRepositoryError>;

    /// Insert a measurement for an owned challenge.
    async fn create(
        &self,
        owner: &UserId,
        draft: &MeasurementDraft,
    ) -> Result<Measurement, MeasurementRepositoryError>;

    /// Fetch one measurement owned through its challenge.
    async fn find_for_owner(
        &self,
        owner: &UserId,
        measurement_id: Uuid,
    ) -> Result<Option<Measurement>, MeasurementRepositoryError>;

    /// Replace the measurement's values.
    async fn update(
        &self,
        owner: &UserId,
        measurement_id: Uuid,
        changes: &MeasurementChanges,
    ) -> Result<Measurement, MeasurementRepositoryError>;

    /// Delete one measurement.
    async fn delete(
        &self,
        owner: &UserId,
        measurement_id: Uuid,
    ) -> Result<(), MeasurementRepositoryError>;
}
