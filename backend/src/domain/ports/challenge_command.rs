//! Driving port for challenge mutations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Challenge, ChallengeStatus, EntityName, Error, UserId};

/// Identifies a challenge on behalf of its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRef {
    pub owner: UserId,
    pub challenge_id: Uuid,
}

/// Request to start a new challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateChallengeRequest {
    pub owner: UserId,
    pub name: EntityName,
    pub description: String,
    /// Defaults to the current time.
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Request to replace a challenge's editable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateChallengeRequest {
    pub owner: UserId,
    pub challenge_id: Uuid,
    pub name: EntityName,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub current_day: u32,
    pub status: ChallengeStatus,
}

/// Driving port for challenge write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChallengeCommand: Send + Sync {
    /// Create a challenge on day 1 with status `active`.
    async fn create_challenge(&self, request: CreateChallengeRequest) -> Result<Challenge, Error>;

    /// Replace the editable fields of an owned challenge.
    async fn update_challenge(&self, request: UpdateChallengeRequest) -> Result<Challenge, Error>;

    /// Delete a challenge and everything it owns.
    async fn delete_challenge(&self, challenge: ChallengeRef) -> Result<(), Error>;

    /// Restart a challenge from day 1, discarding its day records.
    async fn reset_challenge(&self, challenge: ChallengeRef) -> Result<Challenge, Error>;
}
