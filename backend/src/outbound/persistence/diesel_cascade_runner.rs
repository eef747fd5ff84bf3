//! Executes cascade steps and sibling shifts against one open connection.
//!
//! The runner borrows the connection of a transaction that the calling
//! repository opened; it never commits or rolls back itself.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::{CascadeStep, CascadeStepRunner, ChallengeStatus, OrderShift, SiblingParent};

use super::models::to_db_int;
use super::schema::{challenges, day_records, measurements, sections, task_records, tasks};

/// Apply `shift` to the siblings under `parent` as one `UPDATE`.
///
/// Returns the number of siblings moved.
pub(crate) async fn shift_siblings(
    conn: &mut AsyncPgConnection,
    parent: SiblingParent,
    shift: OrderShift,
) -> Result<u64, DieselError> {
    let first = to_db_int(shift.lowest());
    let last = shift.highest().map_or(i32::MAX, to_db_int);
    let delta = shift.direction().delta();

    let rows = match parent {
        SiblingParent::Challenge(challenge_id) => {
            diesel::update(
                sections::table
                    .filter(sections::challenge_id.eq(challenge_id))
                    .filter(sections::position.between(first, last)),
            )
            .set(sections::position.eq(sections::position + delta))
            .execute(conn)
            .await?
        }
        SiblingParent::Section(section_id) => {
            diesel::update(
                tasks::table
                    .filter(tasks::section_id.eq(section_id))
                    .filter(tasks::position.between(first, last)),
            )
            .set(tasks::position.eq(tasks::position + delta))
            .execute(conn)
            .await?
        }
    };
    Ok(rows as u64)
}

/// [`CascadeStepRunner`] issuing one statement per step.
pub(crate) struct DieselCascadeRunner<'c> {
    conn: &'c mut AsyncPgConnection,
}

impl<'c> DieselCascadeRunner<'c> {
    pub(crate) fn new(conn: &'c mut AsyncPgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CascadeStepRunner for DieselCascadeRunner<'_> {
    type Error = DieselError;

    async fn run(&mut self, step: &CascadeStep) -> Result<u64, Self::Error> {
        let conn = &mut *self.conn;
        let rows = match step {
            CascadeStep::DeleteTasksOfSection { section_id } => {
                diesel::delete(tasks::table.filter(tasks::section_id.eq(*section_id)))
                    .execute(conn)
                    .await?
            }
            CascadeStep::DeleteTaskRecordsOfDayRecord { day_record_id } => {
                diesel::delete(
                    task_records::table.filter(task_records::day_record_id.eq(*day_record_id)),
                )
                .execute(conn)
                .await?
            }
            CascadeStep::DeleteTaskRecordsOfTask { task_id } => {
                diesel::delete(task_records::table.filter(task_records::task_id.eq(*task_id)))
                    .execute(conn)
                    .await?
            }
            CascadeStep::DeleteDayRecords { challenge_id } => {
                diesel::delete(day_records::table.filter(day_records::challenge_id.eq(*challenge_id)))
                    .execute(conn)
                    .await?
            }
            CascadeStep::DeleteMeasurements { challenge_id } => {
                diesel::delete(
                    measurements::table.filter(measurements::challenge_id.eq(*challenge_id)),
                )
                .execute(conn)
                .await?
            }
            CascadeStep::DeleteSections { challenge_id } => {
                diesel::delete(sections::table.filter(sections::challenge_id.eq(*challenge_id)))
                    .execute(conn)
                    .await?
            }
            CascadeStep::DeleteChallenge {
                challenge_id,
                owner,
            } => {
                diesel::delete(
                    challenges::table
                        .filter(challenges::id.eq(*challenge_id))
                        .filter(challenges::owner_id.eq(owner.as_ref())),
                )
                .execute(conn)
                .await?
            }
            CascadeStep::RestartChallenge {
                challenge_id,
                owner,
            } => {
                diesel::update(
                    challenges::table
                        .filter(challenges::id.eq(*challenge_id))
                        .filter(challenges::owner_id.eq(owner.as_ref())),
                )
                .set((
                    challenges::current_day.eq(1),
                    challenges::status.eq(ChallengeStatus::Active.as_str()),
                    challenges::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .await?
            }
            CascadeStep::DeleteSection { section_id } => {
                diesel::delete(sections::table.filter(sections::id.eq(*section_id)))
                    .execute(conn)
                    .await?
            }
            CascadeStep::DeleteTask { task_id } => {
                diesel::delete(tasks::table.filter(tasks::id.eq(*task_id)))
                    .execute(conn)
                    .await?
            }
            CascadeStep::CompactSiblings { parent, shift } => {
                return shift_siblings(conn, *parent, *shift).await;
            }
        };
        Ok(rows as u64)
    }
}
