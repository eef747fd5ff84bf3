//! Port for challenge persistence, including the challenge-level cascades.
//!
//! Every operation is scoped to an owner. A challenge that exists but belongs
//! to someone else is indistinguishable from one that does not exist.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Challenge, ChallengeChanges, ChallengeDraft, DayCompletion, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by challenge repository adapters.
    pub enum ChallengeRepositoryError for "challenge repository" {
        /// No challenge with this id is owned by the caller.
        NotFound { challenge_id: Uuid } =>
            "challenge {challenge_id} not found",
    }
}

/// Port for challenge storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    /// Insert a new challenge on day 1 with status `active`.
    async fn create(&self, draft: &ChallengeDraft) -> Result<Challenge, ChallengeRepositoryError>;

    /// List the owner's challenges, newest first.
    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Challenge>, ChallengeRepositoryError>;

    /// Fetch one challenge owned by `owner`.
    async fn find_for_owner(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Option<Challenge>, ChallengeRepositoryError>;

    /// Replace the editable fields of an owned challenge.
    async fn update(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
        changes: &ChallengeChanges,
    ) -> Result<Challenge, ChallengeRepositoryError>;

    /// Delete the challenge and all of its descendants atomically.
    async fn delete_cascade(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<(), ChallengeRepositoryError>;

    /// Restart the challenge on day 1 and discard its day ledger atomically.
    async fn reset(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Challenge, ChallengeRepositoryError>;

    /// Completion flags of the challenge's day records, ascending by day.
    ///
    /// Callers must have established ownership beforehand.
    async fn day_completions(
        &self,
        challenge_id: Uuid,
    ) -> Result<Vec<DayCompletion>, ChallengeRepositoryError>;
}
