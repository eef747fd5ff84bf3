//! Body measurements logged alongside a challenge.
//!
//! Measurements are plain records: they carry no ordering and are never
//! touched by a reset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors raised by [`BodyMetrics::new`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("{metric} must be finite and non-negative (got {value})")]
pub struct MetricValidationError {
    pub metric: &'static str,
    pub value: f64,
}

/// The fixed set of body metrics. Unrecorded values are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyMetrics {
    pub weight: f64,
    pub chest: f64,
    pub waist: f64,
    pub hips: f64,
    pub arms: f64,
    pub thighs: f64,
}

impl BodyMetrics {
    /// Validate every metric.
    ///
    /// # Examples
    /// ```
    /// use hardinfinity::domain::BodyMetrics;
    ///
    /// let metrics = BodyMetrics::new(80.5, 100.0, 85.0, 95.0, 35.0, 55.0).expect("valid");
    /// assert_eq!(metrics.weight, 80.5);
    /// assert!(BodyMetrics::new(-1.0, 0.0, 0.0, 0.0, 0.0, 0.0).is_err());
    /// ```
    pub fn new(
        weight: f64,
        chest: f64,
        waist: f64,
        hips: f64,
        arms: f64,
        thighs: f64,
    ) -> Result<Self, MetricValidationError> {
        for (metric, value) in [
            ("weight", weight),
            ("chest", chest),
            ("waist", waist),
            ("hips", hips),
            ("arms", arms),
            ("thighs", thighs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(MetricValidationError { metric, value });
            }
        }
        Ok(Self {
            weight,
            chest,
            waist,
            hips,
            arms,
            thighs,
        })
    }
}

/// Persisted measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub day_number: u32,
    pub date: DateTime<Utc>,
    #[serde(flatten)]
    pub metrics: BodyMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a measurement.
///
/// The service resolves the day number and date before the draft reaches a
/// repository.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementDraft {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub day_number: u32,
    pub date: DateTime<Utc>,
    pub metrics: BodyMetrics,
}

/// Replacement values for an existing measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementChanges {
    pub day_number: u32,
    pub date: DateTime<Utc>,
    pub metrics: BodyMetrics,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("weight", [-0.5, 0.0, 0.0, 0.0, 0.0, 0.0])]
    #[case("waist", [70.0, 90.0, f64::NAN, 0.0, 0.0, 0.0])]
    #[case("thighs", [70.0, 90.0, 80.0, 0.0, 0.0, f64::INFINITY])]
    fn rejects_invalid_metrics(#[case] metric: &str, #[case] values: [f64; 6]) {
        let [weight, chest, waist, hips, arms, thighs] = values;
        let err = BodyMetrics::new(weight, chest, waist, hips, arms, thighs)
            .expect_err("invalid metric");
        assert_eq!(err.metric, metric);
    }

    #[rstest]
    fn accepts_zeroes() {
        assert_eq!(
            BodyMetrics::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            Ok(BodyMetrics::default())
        );
    }
}
