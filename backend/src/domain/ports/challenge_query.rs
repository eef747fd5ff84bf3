//! Driving port for challenge reads and progress reporting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Challenge, ChallengeStatus, Error, StreakSummary, UserId};

use super::ChallengeRef;

/// Progress report for one challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeProgress {
    pub challenge_id: Uuid,
    pub current_day: u32,
    pub status: ChallengeStatus,
    #[serde(flatten)]
    pub streaks: StreakSummary,
}

/// Driving port for challenge read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChallengeQuery: Send + Sync {
    /// The caller's challenges, newest first.
    async fn list_challenges(&self, owner: &UserId) -> Result<Vec<Challenge>, Error>;

    /// One owned challenge.
    async fn get_challenge(&self, challenge: ChallengeRef) -> Result<Challenge, Error>;

    /// Streak and completion metrics derived from the day ledger.
    async fn challenge_progress(&self, challenge: ChallengeRef)
    -> Result<ChallengeProgress, Error>;
}
