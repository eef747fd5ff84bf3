//! PostgreSQL-backed `TaskRepository`.
//!
//! Tasks are an ordered sibling set per section. Ownership is resolved by
//! joining through the section to its challenge.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{TaskRepository, TaskRepositoryError};
use crate::domain::{
    SiblingOrder, SiblingParent, Task, TaskDraft, TaskSettings, UserId, delete_task_plan,
    plan_insert, plan_move, run_cascade,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_cascade_runner::{DieselCascadeRunner, shift_siblings};
use super::diesel_section_repository::{lock_owned_section, max_order};
use super::diesel_transaction::TxError;
use super::models::{NewTaskRow, TaskRow, TaskSettingsUpdate, to_db_int};
use super::pool::{DbPool, PoolError};
use super::schema::{challenges, sections, tasks};

/// Diesel-backed implementation of the task repository port.
#[derive(Clone)]
pub struct DieselTaskRepository {
    pool: DbPool,
}

impl DieselTaskRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TaskRepositoryError {
    map_basic_pool_error(error)
}

fn map_diesel_error(error: diesel::result::Error) -> TaskRepositoryError {
    map_basic_diesel_error(error)
}

fn row_to_task(row: TaskRow) -> Result<Task, TaskRepositoryError> {
    Task::try_from(row).map_err(TaskRepositoryError::query)
}

fn settings_update(settings: &TaskSettings) -> TaskSettingsUpdate<'_> {
    TaskSettingsUpdate {
        name: settings.name.as_ref(),
        description: &settings.description,
        task_type: settings.task_type.as_str(),
        required: settings.required,
        restart_on_fail: settings.restart_on_fail,
        strikes_enabled: settings.strikes.enabled(),
        strikes_limit: to_db_int(settings.strikes.limit()),
        updated_at: Utc::now(),
    }
}

async fn lock_owned_task(
    conn: &mut AsyncPgConnection,
    owner: &UserId,
    task_id: Uuid,
) -> Result<Option<TaskRow>, diesel::result::Error> {
    tasks::table
        .inner_join(sections::table.inner_join(challenges::table))
        .filter(tasks::id.eq(task_id))
        .filter(challenges::owner_id.eq(owner.as_ref()))
        .select(TaskRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()
}

#[async_trait]
impl TaskRepository for DieselTaskRepository {
    async fn list(&self, owner: &UserId, section_id: Uuid) -> Result<Vec<Task>, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owned: Option<Uuid> = sections::table
            .inner_join(challenges::table)
            .filter(sections::id.eq(section_id))
            .filter(challenges::owner_id.eq(owner.as_ref()))
            .select(sections::id)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        if owned.is_none() {
            return Err(TaskRepositoryError::section_not_found(section_id));
        }

        let rows: Vec<TaskRow> = tasks::table
            .filter(tasks::section_id.eq(section_id))
            .order(tasks::position.asc())
            .select(TaskRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_task).collect()
    }

    async fn create(&self, owner: &UserId, draft: &TaskDraft) -> Result<Task, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = owner.clone();
        let draft = draft.clone();

        let row = conn
            .transaction::<_, TxError<TaskRepositoryError>, _>(|conn| {
                async move {
                    let section_id = draft.section_id;
                    if lock_owned_section(conn, &owner, section_id).await?.is_none() {
                        return Err(TxError::Domain(TaskRepositoryError::section_not_found(
                            section_id,
                        )));
                    }
                    let current_max: Option<i32> = tasks::table
                        .filter(tasks::section_id.eq(section_id))
                        .select(diesel::dsl::max(tasks::position))
                        .first(conn)
                        .await?;

                    let plan = plan_insert(max_order(current_max), draft.position);
                    if let Some(shift) = plan.shift {
                        shift_siblings(conn, SiblingParent::Section(section_id), shift).await?;
                    }

                    let settings = &draft.settings;
                    let row = diesel::insert_into(tasks::table)
                        .values(&NewTaskRow {
                            id: draft.id,
                            section_id,
                            name: settings.name.as_ref(),
                            description: &settings.description,
                            task_type: settings.task_type.as_str(),
                            required: settings.required,
                            restart_on_fail: settings.restart_on_fail,
                            strikes_enabled: settings.strikes.enabled(),
                            strikes_limit: to_db_int(settings.strikes.limit()),
                            position: to_db_int(plan.position.get()),
                        })
                        .returning(TaskRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_port(map_diesel_error))?;
        row_to_task(row)
    }

    async fn update(
        &self,
        owner: &UserId,
        task_id: Uuid,
        settings: &TaskSettings,
    ) -> Result<Task, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owned_sections = sections::table
            .inner_join(challenges::table)
            .filter(challenges::owner_id.eq(owner.as_ref()))
            .select(sections::id);

        let row: Option<TaskRow> = diesel::update(
            tasks::table
                .filter(tasks::id.eq(task_id))
                .filter(tasks::section_id.eq_any(owned_sections)),
        )
        .set(&settings_update(settings))
        .returning(TaskRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        row_to_task(row.ok_or_else(|| TaskRepositoryError::not_found(task_id))?)
    }

    async fn move_to(
        &self,
        owner: &UserId,
        task_id: Uuid,
        target: SiblingOrder,
    ) -> Result<Task, TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = owner.clone();

        let row = conn
            .transaction::<_, TxError<TaskRepositoryError>, _>(|conn| {
                async move {
                    let task = lock_owned_task(conn, &owner, task_id)
                        .await?
                        .ok_or(TxError::Domain(TaskRepositoryError::not_found(task_id)))?;
                    let current = SiblingOrder::new(i64::from(task.position)).map_err(|err| {
                        TxError::Domain(TaskRepositoryError::query(err.to_string()))
                    })?;
                    let Some(plan) = plan_move(current, target) else {
                        return Ok(task);
                    };

                    shift_siblings(conn, SiblingParent::Section(task.section_id), plan.shift)
                        .await?;
                    let row = diesel::update(tasks::table.find(task_id))
                        .set((
                            tasks::position.eq(to_db_int(plan.target.get())),
                            tasks::updated_at.eq(Utc::now()),
                        ))
                        .returning(TaskRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_port(map_diesel_error))?;
        row_to_task(row)
    }

    async fn delete(&self, owner: &UserId, task_id: Uuid) -> Result<(), TaskRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owner = owner.clone();

        let affected = conn
            .transaction::<_, TxError<TaskRepositoryError>, _>(|conn| {
                async move {
                    let row = lock_owned_task(conn, &owner, task_id)
                        .await?
                        .ok_or(TxError::Domain(TaskRepositoryError::not_found(task_id)))?;
                    let task = row_to_task(row).map_err(TxError::Domain)?;

                    let plan = delete_task_plan(&task);
                    let mut runner = DieselCascadeRunner::new(conn);
                    run_cascade(&mut runner, &plan).await.map_err(|err| {
                        TxError::from_cascade(err, || TaskRepositoryError::not_found(task_id))
                    })
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| err.into_port(map_diesel_error))?;

        debug!(%task_id, rows = affected, "task cascade committed");
        Ok(())
    }
}
