//! Challenge domain service.
//!
//! Implements the challenge driving ports on top of a
//! [`ChallengeRepository`]. Cascading deletes and resets are delegated to the
//! repository so they share one storage transaction.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{
    ChallengeCommand, ChallengeProgress, ChallengeQuery, ChallengeRef, ChallengeRepository,
    ChallengeRepositoryError, CreateChallengeRequest, UpdateChallengeRequest,
};
use crate::domain::{
    Challenge, ChallengeChanges, ChallengeDraft, DEFAULT_PROGRAM_LENGTH, Error, UserId,
    summarise_streaks,
};

fn map_repository_error(error: ChallengeRepositoryError) -> Error {
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

pub(crate) fn challenge_not_found(challenge_id: Uuid) -> Error {
    Error::not_found(format!("challenge {challenge_id} not found"))
}

/// Challenge service implementing the command and query driving ports.
#[derive(Clone)]
pub struct ChallengeService<R> {
    challenge_repo: Arc<R>,
    clock: Arc<dyn Clock>,
    program_length: u32,
}

impl<R> ChallengeService<R> {
    /// Create a service using the default program length.
    pub fn new(challenge_repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            challenge_repo,
            clock,
            program_length: DEFAULT_PROGRAM_LENGTH,
        }
    }

    /// Override the number of days a program lasts.
    pub fn with_program_length(mut self, program_length: u32) -> Self {
        self.program_length = program_length;
        self
    }
}

impl<R> ChallengeService<R>
where
    R: ChallengeRepository,
{
    async fn owned(&self, owner: &UserId, challenge_id: Uuid) -> Result<Challenge, Error> {
        self.challenge_repo
            .find_for_owner(owner, challenge_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| challenge_not_found(challenge_id))
    }
}

#[async_trait]
impl<R> ChallengeCommand for ChallengeService<R>
where
    R: ChallengeRepository,
{
    async fn create_challenge(&self, request: CreateChallengeRequest) -> Result<Challenge, Error> {
        let start_date = request.start_date.unwrap_or_else(|| self.clock.utc());
        let draft = ChallengeDraft::new(
            Uuid::new_v4(),
            request.owner,
            request.name,
            request.description,
            start_date,
            request.end_date,
        )
        .map_err(|err| Error::invalid_request(format!("invalid challenge: {err}")))?;

        self.challenge_repo
            .create(&draft)
            .await
            .map_err(map_repository_error)
    }

    async fn update_challenge(&self, request: UpdateChallengeRequest) -> Result<Challenge, Error> {
        let changes = ChallengeChanges::new(
            request.name,
            request.description,
            request.start_date,
            request.end_date,
            request.current_day,
            request.status,
        )
        .map_err(|err| Error::invalid_request(format!("invalid challenge: {err}")))?;

        self.challenge_repo
            .update(&request.owner, request.challenge_id, &changes)
            .await
            .map_err(map_repository_error)
    }

    async fn delete_challenge(&self, challenge: ChallengeRef) -> Result<(), Error> {
        self.challenge_repo
            .delete_cascade(&challenge.owner, challenge.challenge_id)
            .await
            .map_err(map_repository_error)?;
        info!(challenge_id = %challenge.challenge_id, "challenge deleted");
        Ok(())
    }

    async fn reset_challenge(&self, challenge: ChallengeRef) -> Result<Challenge, Error> {
        let reset = self
            .challenge_repo
            .reset(&challenge.owner, challenge.challenge_id)
            .await
            .map_err(map_repository_error)?;
        info!(challenge_id = %challenge.challenge_id, "challenge reset to day 1");
        Ok(reset)
    }
}

#[async_trait]
impl<R> ChallengeQuery for ChallengeService<R>
where
    R: ChallengeRepository,
{
    async fn list_challenges(&self, owner: &UserId) -> Result<Vec<Challenge>, Error> {
        self.challenge_repo
            .list_for_owner(owner)
            .await
            .map_err(map_repository_error)
    }

    async fn get_challenge(&self, challenge: ChallengeRef) -> Result<Challenge, Error> {
        self.owned(&challenge.owner, challenge.challenge_id).await
    }

    async fn challenge_progress(
        &self,
        challenge: ChallengeRef,
    ) -> Result<ChallengeProgress, Error> {
        let owned = self.owned(&challenge.owner, challenge.challenge_id).await?;
        let days = self
            .challenge_repo
            .day_completions(owned.id)
            .await
            .map_err(map_repository_error)?;

        Ok(ChallengeProgress {
            challenge_id: owned.id,
            current_day: owned.current_day,
            status: owned.status,
            streaks: summarise_streaks(&days, self.program_length),
        })
    }
}

#[cfg(test)]
#[path = "challenge_service_tests.rs"]
mod tests;
