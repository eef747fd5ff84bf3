//! Driving ports for the day ledger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{DayEntry, DayRecord, DaySubmission, DayTarget, Error};

use super::ChallengeRef;

/// Request to record a day.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertDayRequest {
    pub challenge: ChallengeRef,
    pub target: DayTarget,
    pub submission: DaySubmission,
}

/// Outcome of recording a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertDayResponse {
    pub entry: DayEntry,
    /// Whether the day had no record before this call.
    pub created: bool,
    /// The challenge's new `current_day`, when this call advanced it.
    pub advanced_to: Option<u32>,
}

/// Identifies one recorded day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRef {
    pub challenge: ChallengeRef,
    pub day_number: u32,
}

/// Driving port for day ledger writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerCommand: Send + Sync {
    /// Create or update a day record and its task records.
    async fn upsert_day(&self, request: UpsertDayRequest) -> Result<UpsertDayResponse, Error>;
}

/// Driving port for day ledger reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// All day records of a challenge, ascending by day.
    async fn list_days(&self, challenge: ChallengeRef) -> Result<Vec<DayRecord>, Error>;

    /// One day with its task records.
    async fn get_day(&self, day: DayRef) -> Result<DayEntry, Error>;
}
