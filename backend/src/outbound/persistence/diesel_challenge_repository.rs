//! PostgreSQL-backed `ChallengeRepository`.
//!
//! Delete and reset enumerate the challenge's dependents and run the domain
//! cascade plan inside one transaction.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{ChallengeRepository, ChallengeRepositoryError};
use crate::domain::{
    Challenge, ChallengeChanges, ChallengeDraft, ChallengeStatus, DayCompletion, UserId,
    delete_challenge_plan, reset_challenge_plan, run_cascade,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_cascade_runner::DieselCascadeRunner;
use super::diesel_transaction::TxError;
use super::models::{ChallengeRow, ChallengeUpdate, NewChallengeRow, to_db_int};
use super::pool::{DbPool, PoolError};
use super::schema::{challenges, day_records, sections};

/// Diesel-backed implementation of the challenge repository port.
#[derive(Clone)]
pub struct DieselChallengeRepository {
    pool: DbPool,
}

impl DieselChallengeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ChallengeRepositoryError {
    map_basic_pool_error(error)
}

fn map_diesel_error(error: diesel::result::Error) -> ChallengeRepositoryError {
    map_basic_diesel_error(error)
}

fn row_to_challenge(row: ChallengeRow) -> Result<Challenge, ChallengeRepositoryError> {
    Challenge::try_from(row).map_err(ChallengeRepositoryError::query)
}

/// Id of the challenge when `owner` owns it.
pub(crate) async fn owned_challenge_id(
    conn: &mut AsyncPgConnection,
    owner: &UserId,
    challenge_id: Uuid,
) -> Result<Option<Uuid>, diesel::result::Error> {
    challenges::table
        .filter(challenges::id.eq(challenge_id))
        .filter(challenges::owner_id.eq(owner.as_ref()))
        .select(challenges::id)
        .first::<Uuid>(conn)
        .await
        .optional()
}

/// The owned challenge, locked for the rest of the transaction.
pub(crate) async fn lock_owned_challenge(
    conn: &mut AsyncPgConnection,
    owner: &UserId,
    challenge_id: Uuid,
) -> Result<Option<ChallengeRow>, diesel::result::Error> {
    challenges::table
        .filter(challenges::id.eq(challenge_id))
        .filter(challenges::owner_id.eq(owner.as_ref()))
        .select(ChallengeRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()
}

async fn day_record_ids(
    conn: &mut AsyncPgConnection,
    challenge_id: Uuid,
) -> Result<Vec<Uuid>, diesel::result::Error> {
    day_records::table
        .filter(day_records::challenge_id.eq(challenge_id))
        .order(day_records::day_number.asc())
        .select(day_records::id)
        .load(conn)
        .await
}

#[async_trait]
impl ChallengeRepository for DieselChallengeRepository {
    async fn create(&self, draft: &ChallengeDraft) -> Result<Challenge, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewChallengeRow {
            id: draft.id,
            owner_id: draft.owner.as_ref(),
            name: draft.name.as_ref(),
            description: &draft.description,
            start_date: draft.start_date,
            end_date: draft.end_date,
            current_day: 1,
            status: ChallengeStatus::Active.as_str(),
        };

        let stored = diesel::insert_into(challenges::table)
            .values(&row)
            .returning(ChallengeRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_challenge(stored)
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Challenge>, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ChallengeRow> = challenges::table
            .filter(challenges::owner_id.eq(owner.as_ref()))
            .order((challenges::created_at.desc(), challenges::id.asc()))
            .select(ChallengeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_challenge).collect()
    }

    async fn find_for_owner(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Option<Challenge>, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ChallengeRow> = challenges::table
            .filter(challenges::id.eq(challenge_id))
            .filter(challenges::owner_id.eq(owner.as_ref()))
            .select(ChallengeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_challenge).transpose()
    }

    async fn update(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
        changes: &ChallengeChanges,
    ) -> Result<Challenge, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let update = ChallengeUpdate {
            name: changes.name.as_ref(),
            description: &changes.description,
            start_date: changes.start_date,
            end_date: changes.end_date,
            current_day: to_db_int(changes.current_day),
            status: changes.status.as_str(),
            updated_at: Utc::now(),
        };

        let stored: Option<ChallengeRow> = diesel::update(
            challenges::table
                .filter(challenges::id.eq(challenge_id))
                .filter(challenges::owner_id.eq(owner.as_ref())),
        )
        .set(&update)
        .returning(ChallengeRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        let row = stored.ok_or_else(|| ChallengeRepositoryError::not_found(challenge_id))?;
        row_to_challenge(row)
    }

    async fn delete_cascade(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<(), ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = owner.clone();

        let affected = conn
            .transaction::<_, TxError<ChallengeRepositoryError>, _>(|conn| {
                async move {
                    if lock_owned_challenge(conn, &owner, challenge_id).await?.is_none() {
                        return Err(TxError::Domain(ChallengeRepositoryError::not_found(
                            challenge_id,
                        )));
                    }
                    let section_ids: Vec<Uuid> = sections::table
                        .filter(sections::challenge_id.eq(challenge_id))
                        .order(sections::position.asc())
                        .select(sections::id)
                        .load(conn)
                        .await?;
                    let day_record_ids = day_record_ids(conn, challenge_id).await?;

                    let plan =
                        delete_challenge_plan(challenge_id, &owner, &section_ids, &day_record_ids);
                    let mut runner = DieselCascadeRunner::new(conn);
                    run_cascade(&mut runner, &plan).await.map_err(|err| {
                        TxError::from_cascade(err, || {
                            ChallengeRepositoryError::not_found(challenge_id)
                        })
                    })
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_port(map_diesel_error))?;

        debug!(%challenge_id, rows = affected, "challenge cascade committed");
        Ok(())
    }

    async fn reset(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Challenge, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = owner.clone();

        let row = conn
            .transaction::<_, TxError<ChallengeRepositoryError>, _>(|conn| {
                async move {
                    if lock_owned_challenge(conn, &owner, challenge_id).await?.is_none() {
                        return Err(TxError::Domain(ChallengeRepositoryError::not_found(
                            challenge_id,
                        )));
                    }
                    let day_record_ids = day_record_ids(conn, challenge_id).await?;
                    let plan = reset_challenge_plan(challenge_id, &owner, &day_record_ids);
                    let mut runner = DieselCascadeRunner::new(conn);
                    run_cascade(&mut runner, &plan).await.map_err(|err| {
                        TxError::from_cascade(err, || {
                            ChallengeRepositoryError::not_found(challenge_id)
                        })
                    })?;

                    let row = challenges::table
                        .find(challenge_id)
                        .select(ChallengeRow::as_select())
                        .first::<ChallengeRow>(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_port(map_diesel_error))?;

        row_to_challenge(row)
    }

    async fn day_completions(
        &self,
        challenge_id: Uuid,
    ) -> Result<Vec<DayCompletion>, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<(i32, bool)> = day_records::table
            .filter(day_records::challenge_id.eq(challenge_id))
            .order(day_records::day_number.asc())
            .select((day_records::day_number, day_records::completed))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|(day, completed)| {
                u32::try_from(day)
                    .map(|day| DayCompletion::new(day, completed))
                    .map_err(|_| ChallengeRepositoryError::query(format!("negative day {day}")))
            })
            .collect()
    }
}
