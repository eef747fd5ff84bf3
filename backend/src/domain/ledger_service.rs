//! Day ledger domain service.
//!
//! Ledger rules run inside the repository's transaction; this service maps
//! their rejections onto caller-facing errors. Writes to a challenge that is
//! no longer active are conflicts, every other rejection is a bad request.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::challenge_service::challenge_not_found;
use crate::domain::ports::{
    ChallengeRef, DayLedgerRepository, DayLedgerRepositoryError, DayRef, LedgerCommand,
    LedgerQuery, UpsertDayRequest, UpsertDayResponse,
};
use crate::domain::{DayEntry, DayRecord, Error, LedgerRejection};

fn map_rejection(rejection: LedgerRejection) -> Error {
    let message = rejection.to_string();
    match rejection {
        LedgerRejection::ChallengeNotActive { status } => Error::conflict(message)
            .with_details(json!({ "code": "challenge_not_active", "status": status })),
        LedgerRejection::DayOutOfRange { day, current_day } => Error::invalid_request(message)
            .with_details(json!({ "field": "day", "value": day, "currentDay": current_day })),
        LedgerRejection::UnknownTask { task_id }
        | LedgerRejection::DuplicateTask { task_id }
        | LedgerRejection::ValueMismatch { task_id, .. } => Error::invalid_request(message)
            .with_details(json!({ "field": "taskRecords", "taskId": task_id })),
    }
}

fn map_repository_error(error: DayLedgerRepositoryError) -> Error {
    match error {
        DayLedgerRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("day ledger unavailable: {message}"))
        }
        DayLedgerRepositoryError::Query { message } => {
            Error::internal(format!("day ledger error: {message}"))
        }
        DayLedgerRepositoryError::ChallengeNotFound { challenge_id } => {
            challenge_not_found(challenge_id)
        }
        DayLedgerRepositoryError::Rejected { rejection } => map_rejection(rejection),
    }
}

/// Day ledger service implementing the command and query driving ports.
#[derive(Clone)]
pub struct LedgerService<R> {
    ledger_repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> LedgerService<R> {
    pub fn new(ledger_repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger_repo, clock }
    }
}

#[async_trait]
impl<R> LedgerCommand for LedgerService<R>
where
    R: DayLedgerRepository,
{
    async fn upsert_day(&self, request: UpsertDayRequest) -> Result<UpsertDayResponse, Error> {
        let outcome = self
            .ledger_repo
            .upsert(
                &request.challenge.owner,
                request.challenge.challenge_id,
                request.target,
                &request.submission,
                self.clock.utc(),
            )
            .await
            .map_err(map_repository_error)?;

        if let Some(current_day) = outcome.advanced_to {
            info!(
                challenge_id = %request.challenge.challenge_id,
                current_day,
                "challenge advanced"
            );
        }

        Ok(UpsertDayResponse {
            entry: outcome.entry,
            created: outcome.created,
            advanced_to: outcome.advanced_to,
        })
    }
}

#[async_trait]
impl<R> LedgerQuery for LedgerService<R>
where
    R: DayLedgerRepository,
{
    async fn list_days(&self, challenge: ChallengeRef) -> Result<Vec<DayRecord>, Error> {
        self.ledger_repo
            .list(&challenge.owner, challenge.challenge_id)
            .await
            .map_err(map_repository_error)
    }

    async fn get_day(&self, day: DayRef) -> Result<DayEntry, Error> {
        self.ledger_repo
            .find_by_day(&day.challenge.owner, day.challenge.challenge_id, day.day_number)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("no entry recorded for day {}", day.day_number)))
    }
}

#[cfg(test)]
#[path = "ledger_service_tests.rs"]
mod tests;
