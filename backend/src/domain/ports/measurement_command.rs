//! Driving ports for body measurements.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{BodyMetrics, Error, Measurement, UserId};

use super::ChallengeRef;

/// Identifies a measurement on behalf of its challenge's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementRef {
    pub owner: UserId,
    pub measurement_id: Uuid,
}

/// Request to log a measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct AddMeasurementRequest {
    pub challenge: ChallengeRef,
    /// Defaults to the challenge's current day.
    pub day_number: Option<u32>,
    /// Defaults to the current time.
    pub date: Option<DateTime<Utc>>,
    pub metrics: BodyMetrics,
}

/// Request to correct a measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateMeasurementRequest {
    pub measurement: MeasurementRef,
    /// Keeps the stored day when absent.
    pub day_number: Option<u32>,
    /// Keeps the stored date when absent.
    pub date: Option<DateTime<Utc>>,
    pub metrics: BodyMetrics,
}

/// Driving port for measurement writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeasurementCommand: Send + Sync {
    async fn add_measurement(&self, request: AddMeasurementRequest) -> Result<Measurement, Error>;

    async fn update_measurement(
        &self,
        request: UpdateMeasurementRequest,
    ) -> Result<Measurement, Error>;

    async fn delete_measurement(&self, measurement: MeasurementRef) -> Result<(), Error>;
}

/// Driving port for measurement reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeasurementQuery: Send + Sync {
    /// Measurements of a challenge, ascending by day.
    async fn list_measurements(&self, challenge: ChallengeRef) -> Result<Vec<Measurement>, Error>;
}
