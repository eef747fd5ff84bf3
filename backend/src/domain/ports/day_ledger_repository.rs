//! Port for the day ledger.
//!
//! Upserts run the domain's ledger planning inside the adapter's transaction
//! so the day record, its task records and the `current_day` advancement
//! commit together or not at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    DayEntry, DayRecord, DaySubmission, DayTarget, DayUpsertOutcome, LedgerRejection, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by day ledger adapters.
    pub enum DayLedgerRepositoryError for "day ledger" {
        /// The challenge is missing or not owned by the caller.
        ChallengeNotFound { challenge_id: Uuid } =>
            "challenge {challenge_id} not found",
        /// The submission was refused by the ledger rules.
        Rejected { rejection: LedgerRejection } =>
            "{rejection}",
    }
}

/// Port for day record storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DayLedgerRepository: Send + Sync {
    /// Day records of an owned challenge, ascending by day number.
    async fn list(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Vec<DayRecord>, DayLedgerRepositoryError>;

    /// One day with its task records, if recorded.
    async fn find_by_day(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
        day_number: u32,
    ) -> Result<Option<DayEntry>, DayLedgerRepositoryError>;

    /// Create or update the targeted day and its task records.
    ///
    /// `recorded_at` stamps the record's date when it is created.
    async fn upsert(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
        target: DayTarget,
        submission: &DaySubmission,
        recorded_at: DateTime<Utc>,
    ) -> Result<DayUpsertOutcome, DayLedgerRepositoryError>;
}
