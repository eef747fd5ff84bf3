//! PostgreSQL-backed `DayLedgerRepository`.
//!
//! An upsert locks the challenge row, runs the domain ledger rules against
//! the current state and writes the day record, its task records and the
//! `current_day` advancement in one transaction. Task records are upserted
//! per task; records for tasks missing from the submission are kept.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{DayLedgerRepository, DayLedgerRepositoryError};
use crate::domain::{
    Challenge, DayEntry, DayRecord, DaySubmission, DayTarget, DayUpsertOutcome, TaskRecord,
    TaskType, UserId, ValidatedTaskRecord, plan_day_upsert, resolve_day,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_challenge_repository::{lock_owned_challenge, owned_challenge_id};
use super::diesel_transaction::TxError;
use super::models::{
    DayRecordRow, DayRecordUpdate, NewDayRecordRow, NewTaskRecordRow, TaskRecordRow, rating_to_db,
    to_db_int,
};
use super::pool::{DbPool, PoolError};
use super::schema::{challenges, day_records, sections, task_records, tasks};

/// Diesel-backed implementation of the day ledger port.
#[derive(Clone)]
pub struct DieselDayLedgerRepository {
    pool: DbPool,
}

impl DieselDayLedgerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> DayLedgerRepositoryError {
    map_basic_pool_error(error)
}

fn map_diesel_error(error: diesel::result::Error) -> DayLedgerRepositoryError {
    map_basic_diesel_error(error)
}

fn to_entry(
    record: DayRecordRow,
    task_rows: Vec<TaskRecordRow>,
) -> Result<DayEntry, DayLedgerRepositoryError> {
    let record = DayRecord::try_from(record).map_err(DayLedgerRepositoryError::query)?;
    let task_records = task_rows
        .into_iter()
        .map(TaskRecord::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(DayLedgerRepositoryError::query)?;
    Ok(DayEntry {
        record,
        task_records,
    })
}

fn encode_value(record: &ValidatedTaskRecord) -> Result<Option<serde_json::Value>, DayLedgerRepositoryError> {
    record
        .value
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|err| DayLedgerRepositoryError::query(format!("encode task value: {err}")))
}

async fn load_task_records(
    conn: &mut AsyncPgConnection,
    day_record_id: Uuid,
) -> Result<Vec<TaskRecordRow>, diesel::result::Error> {
    task_records::table
        .inner_join(tasks::table.inner_join(sections::table))
        .filter(task_records::day_record_id.eq(day_record_id))
        .order((sections::position.asc(), tasks::position.asc()))
        .select(TaskRecordRow::as_select())
        .load(conn)
        .await
}

async fn task_types(
    conn: &mut AsyncPgConnection,
    challenge_id: Uuid,
) -> Result<HashMap<Uuid, TaskType>, TxError<DayLedgerRepositoryError>> {
    let rows: Vec<(Uuid, String)> = tasks::table
        .inner_join(sections::table)
        .filter(sections::challenge_id.eq(challenge_id))
        .select((tasks::id, tasks::task_type))
        .load(conn)
        .await?;
    rows.into_iter()
        .map(|(id, raw)| {
            raw.parse::<TaskType>()
                .map(|task_type| (id, task_type))
                .map_err(|err| TxError::Domain(DayLedgerRepositoryError::query(err.to_string())))
        })
        .collect()
}

/// Rows written by one upsert.
struct WrittenDay {
    record: DayRecordRow,
    task_records: Vec<TaskRecordRow>,
    created: bool,
    advanced_to: Option<u32>,
}

#[async_trait]
impl DayLedgerRepository for DieselDayLedgerRepository {
    async fn list(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Vec<DayRecord>, DayLedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        owned_challenge_id(&mut conn, owner, challenge_id)
            .await
            .map_err(map_diesel_error)?
            .ok_or_else(|| DayLedgerRepositoryError::challenge_not_found(challenge_id))?;

        let rows: Vec<DayRecordRow> = day_records::table
            .filter(day_records::challenge_id.eq(challenge_id))
            .order(day_records::day_number.asc())
            .select(DayRecordRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(|row| DayRecord::try_from(row).map_err(DayLedgerRepositoryError::query))
            .collect()
    }

    async fn find_by_day(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
        day_number: u32,
    ) -> Result<Option<DayEntry>, DayLedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        owned_challenge_id(&mut conn, owner, challenge_id)
            .await
            .map_err(map_diesel_error)?
            .ok_or_else(|| DayLedgerRepositoryError::challenge_not_found(challenge_id))?;

        let record: Option<DayRecordRow> = day_records::table
            .filter(day_records::challenge_id.eq(challenge_id))
            .filter(day_records::day_number.eq(to_db_int(day_number)))
            .select(DayRecordRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(record) = record else {
            return Ok(None);
        };

        let task_rows = load_task_records(&mut conn, record.id)
            .await
            .map_err(map_diesel_error)?;
        to_entry(record, task_rows).map(Some)
    }

    async fn upsert(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
        target: DayTarget,
        submission: &DaySubmission,
        recorded_at: DateTime<Utc>,
    ) -> Result<DayUpsertOutcome, DayLedgerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = owner.clone();
        let submission = submission.clone();

        let written = conn
            .transaction::<_, TxError<DayLedgerRepositoryError>, _>(|conn| {
                async move {
                    let row = lock_owned_challenge(conn, &owner, challenge_id)
                        .await?
                        .ok_or(TxError::Domain(DayLedgerRepositoryError::challenge_not_found(
                            challenge_id,
                        )))?;
                    let challenge = Challenge::try_from(row)
                        .map_err(|err| TxError::Domain(DayLedgerRepositoryError::query(err)))?;
                    let reject =
                        |rejection| TxError::Domain(DayLedgerRepositoryError::rejected(rejection));

                    let day_number = resolve_day(&challenge, target).map_err(reject)?;
                    let existing: Option<DayRecordRow> = day_records::table
                        .filter(day_records::challenge_id.eq(challenge_id))
                        .filter(day_records::day_number.eq(to_db_int(day_number)))
                        .select(DayRecordRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let types = task_types(conn, challenge_id).await?;
                    let plan = plan_day_upsert(
                        &challenge,
                        day_number,
                        existing.is_some(),
                        &submission,
                        &types,
                    )
                    .map_err(reject)?;

                    let photo = submission.progress_photo_url.as_deref();
                    let created = existing.is_none();
                    let record = match existing {
                        Some(existing) => {
                            diesel::update(day_records::table.find(existing.id))
                                .set(&DayRecordUpdate {
                                    completed: submission.completed,
                                    notes: &submission.notes,
                                    progress_photo_url: photo,
                                    energy_level: rating_to_db(submission.energy_level),
                                    mood_level: rating_to_db(submission.mood_level),
                                    updated_at: Utc::now(),
                                })
                                .returning(DayRecordRow::as_returning())
                                .get_result(conn)
                                .await?
                        }
                        None => {
                            diesel::insert_into(day_records::table)
                                .values(&NewDayRecordRow {
                                    id: Uuid::new_v4(),
                                    challenge_id,
                                    day_number: to_db_int(day_number),
                                    date: recorded_at,
                                    completed: submission.completed,
                                    notes: &submission.notes,
                                    progress_photo_url: photo,
                                    energy_level: rating_to_db(submission.energy_level),
                                    mood_level: rating_to_db(submission.mood_level),
                                })
                                .returning(DayRecordRow::as_returning())
                                .get_result(conn)
                                .await?
                        }
                    };

                    for task_record in &plan.task_records {
                        let value = encode_value(task_record).map_err(TxError::Domain)?;
                        diesel::insert_into(task_records::table)
                            .values(&NewTaskRecordRow {
                                id: Uuid::new_v4(),
                                day_record_id: record.id,
                                task_id: task_record.task_id,
                                completed: task_record.completed,
                                value,
                                notes: &task_record.notes,
                            })
                            .on_conflict((task_records::day_record_id, task_records::task_id))
                            .do_update()
                            .set((
                                task_records::completed.eq(excluded(task_records::completed)),
                                task_records::value.eq(excluded(task_records::value)),
                                task_records::notes.eq(excluded(task_records::notes)),
                                task_records::updated_at.eq(Utc::now()),
                            ))
                            .execute(conn)
                            .await?;
                    }

                    if let Some(next_day) = plan.advance_to {
                        diesel::update(challenges::table.find(challenge_id))
                            .set((
                                challenges::current_day.eq(to_db_int(next_day)),
                                challenges::updated_at.eq(Utc::now()),
                            ))
                            .execute(conn)
                            .await?;
                    }

                    let task_records = load_task_records(conn, record.id).await?;
                    Ok(WrittenDay {
                        record,
                        task_records,
                        created,
                        advanced_to: plan.advance_to,
                    })
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_port(map_diesel_error))?;

        Ok(DayUpsertOutcome {
            entry: to_entry(written.record, written.task_records)?,
            created: written.created,
            advanced_to: written.advanced_to,
        })
    }
}
