//! PostgreSQL-backed `SectionRepository`.
//!
//! Sections are an ordered sibling set per challenge. Inserts, moves and
//! deletes lock the parent challenge row, apply the domain ordering plan as
//! a single bulk shift and write the section itself in the same transaction.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{SectionRepository, SectionRepositoryError};
use crate::domain::{
    Section, SectionChanges, SectionDraft, SiblingOrder, SiblingParent, UserId,
    delete_section_plan, plan_insert, plan_move, run_cascade,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_cascade_runner::{DieselCascadeRunner, shift_siblings};
use super::diesel_challenge_repository::{lock_owned_challenge, owned_challenge_id};
use super::diesel_transaction::TxError;
use super::models::{NewSectionRow, SectionRow, to_db_int};
use super::pool::{DbPool, PoolError};
use super::schema::{challenges, sections, tasks};

/// Diesel-backed implementation of the section repository port.
#[derive(Clone)]
pub struct DieselSectionRepository {
    pool: DbPool,
}

impl DieselSectionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SectionRepositoryError {
    map_basic_pool_error(error)
}

fn map_diesel_error(error: diesel::result::Error) -> SectionRepositoryError {
    map_basic_diesel_error(error)
}

fn row_to_section(row: SectionRow) -> Result<Section, SectionRepositoryError> {
    Section::try_from(row).map_err(SectionRepositoryError::query)
}

/// Highest order among a parent's siblings, if any.
pub(crate) fn max_order(value: Option<i32>) -> Option<SiblingOrder> {
    value.and_then(|raw| SiblingOrder::new(i64::from(raw)).ok())
}

/// The section when its challenge belongs to `owner`, locked together with
/// that challenge.
pub(crate) async fn lock_owned_section(
    conn: &mut AsyncPgConnection,
    owner: &UserId,
    section_id: Uuid,
) -> Result<Option<SectionRow>, diesel::result::Error> {
    sections::table
        .inner_join(challenges::table)
        .filter(sections::id.eq(section_id))
        .filter(challenges::owner_id.eq(owner.as_ref()))
        .select(SectionRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()
}

#[async_trait]
impl SectionRepository for DieselSectionRepository {
    async fn list(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Vec<Section>, SectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        owned_challenge_id(&mut conn, owner, challenge_id)
            .await
            .map_err(map_diesel_error)?
            .ok_or_else(|| SectionRepositoryError::challenge_not_found(challenge_id))?;

        let rows: Vec<SectionRow> = sections::table
            .filter(sections::challenge_id.eq(challenge_id))
            .order(sections::position.asc())
            .select(SectionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_section).collect()
    }

    async fn create(
        &self,
        owner: &UserId,
        draft: &SectionDraft,
    ) -> Result<Section, SectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = owner.clone();
        let draft = draft.clone();

        let row = conn
            .transaction::<_, TxError<SectionRepositoryError>, _>(|conn| {
                async move {
                    let challenge_id = draft.challenge_id;
                    if lock_owned_challenge(conn, &owner, challenge_id).await?.is_none() {
                        return Err(TxError::Domain(SectionRepositoryError::challenge_not_found(
                            challenge_id,
                        )));
                    }
                    let current_max: Option<i32> = sections::table
                        .filter(sections::challenge_id.eq(challenge_id))
                        .select(diesel::dsl::max(sections::position))
                        .first(conn)
                        .await?;

                    let plan = plan_insert(max_order(current_max), draft.position);
                    if let Some(shift) = plan.shift {
                        shift_siblings(conn, SiblingParent::Challenge(challenge_id), shift).await?;
                    }

                    let row = diesel::insert_into(sections::table)
                        .values(&NewSectionRow {
                            id: draft.id,
                            challenge_id,
                            name: draft.name.as_ref(),
                            description: &draft.description,
                            position: to_db_int(plan.position.get()),
                        })
                        .returning(SectionRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_port(map_diesel_error))?;
        row_to_section(row)
    }

    async fn update(
        &self,
        owner: &UserId,
        section_id: Uuid,
        changes: &SectionChanges,
    ) -> Result<Section, SectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owned = challenges::table
            .filter(challenges::owner_id.eq(owner.as_ref()))
            .select(challenges::id);

        let row: Option<SectionRow> = diesel::update(
            sections::table
                .filter(sections::id.eq(section_id))
                .filter(sections::challenge_id.eq_any(owned)),
        )
        .set((
            sections::name.eq(changes.name.as_ref()),
            sections::description.eq(changes.description.as_str()),
            sections::updated_at.eq(Utc::now()),
        ))
        .returning(SectionRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        row_to_section(row.ok_or_else(|| SectionRepositoryError::not_found(section_id))?)
    }

    async fn move_to(
        &self,
        owner: &UserId,
        section_id: Uuid,
        target: SiblingOrder,
    ) -> Result<Section, SectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = owner.clone();

        let row = conn
            .transaction::<_, TxError<SectionRepositoryError>, _>(|conn| {
                async move {
                    let section = lock_owned_section(conn, &owner, section_id)
                        .await?
                        .ok_or(TxError::Domain(SectionRepositoryError::not_found(section_id)))?;
                    let current = SiblingOrder::new(i64::from(section.position)).map_err(|err| {
                        TxError::Domain(SectionRepositoryError::query(err.to_string()))
                    })?;
                    let Some(plan) = plan_move(current, target) else {
                        return Ok(section);
                    };

                    shift_siblings(conn, SiblingParent::Challenge(section.challenge_id), plan.shift)
                        .await?;
                    let row = diesel::update(sections::table.find(section_id))
                        .set((
                            sections::position.eq(to_db_int(plan.target.get())),
                            sections::updated_at.eq(Utc::now()),
                        ))
                        .returning(SectionRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_port(map_diesel_error))?;
        row_to_section(row)
    }

    async fn delete(&self, owner: &UserId, section_id: Uuid) -> Result<(), SectionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = owner.clone();

        let affected = conn
            .transaction::<_, TxError<SectionRepositoryError>, _>(|conn| {
                async move {
                    let row = lock_owned_section(conn, &owner, section_id)
                        .await?
                        .ok_or(TxError::Domain(SectionRepositoryError::not_found(section_id)))?;
                    let section = row_to_section(row).map_err(TxError::Domain)?;
                    let task_ids: Vec<Uuid> = tasks::table
                        .filter(tasks::section_id.eq(section_id))
                        .select(tasks::id)
                        .load(conn)
                        .await?;

                    let plan = delete_section_plan(&section, &task_ids);
                    let mut runner = DieselCascadeRunner::new(conn);
                    run_cascade(&mut runner, &plan).await.map_err(|err| {
                        TxError::from_cascade(err, || SectionRepositoryError::not_found(section_id))
                    })
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_port(map_diesel_error))?;

        debug!(%section_id, rows = affected, "section cascade committed");
        Ok(())
    }
}
