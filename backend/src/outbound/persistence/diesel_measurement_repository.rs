//! PostgreSQL-backed `MeasurementRepository`.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{MeasurementRepository, MeasurementRepositoryError};
use crate::domain::{Measurement, MeasurementChanges, MeasurementDraft, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::diesel_challenge_repository::owned_challenge_id;
use super::models::{MeasurementRow, MeasurementUpdate, NewMeasurementRow, to_db_int};
use super::pool::{DbPool, PoolError};
use super::schema::{challenges, measurements};

/// Diesel-backed implementation of the measurement repository port.
#[derive(Clone)]
pub struct DieselMeasurementRepository {
    pool: DbPool,
}

impl DieselMeasurementRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MeasurementRepositoryError {
    map_basic_pool_error(error)
}

fn map_diesel_error(error: diesel::result::Error) -> MeasurementRepositoryError {
    map_basic_diesel_error(error)
}

fn row_to_measurement(row: MeasurementRow) -> Result<Measurement, MeasurementRepositoryError> {
    Measurement::try_from(row).map_err(MeasurementRepositoryError::query)
}

#[async_trait]
impl MeasurementRepository for DieselMeasurementRepository {
    async fn list(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Vec<Measurement>, MeasurementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        owned_challenge_id(&mut conn, owner, challenge_id)
            .await
            .map_err(map_diesel_error)?
            .ok_or_else(|| MeasurementRepositoryError::challenge_not_found(challenge_id))?;

        let rows: Vec<MeasurementRow> = measurements::table
            .filter(measurements::challenge_id.eq(challenge_id))
            .order((measurements::day_number.asc(), measurements::created_at.asc()))
            .select(MeasurementRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_measurement).collect()
    }

    async fn create(
        &self,
        owner: &UserId,
        draft: &MeasurementDraft,
    ) -> Result<Measurement, MeasurementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        owned_challenge_id(&mut conn, owner, draft.challenge_id)
            .await
            .map_err(map_diesel_error)?
            .ok_or_else(|| MeasurementRepositoryError::challenge_not_found(draft.challenge_id))?;

        let metrics = &draft.metrics;
        let row = diesel::insert_into(measurements::table)
            .values(&NewMeasurementRow {
                id: draft.id,
                challenge_id: draft.challenge_id,
                day_number: to_db_int(draft.day_number),
                date: draft.date,
                weight: metrics.weight,
                chest: metrics.chest,
                waist: metrics.waist,
                hips: metrics.hips,
                arms: metrics.arms,
                thighs: metrics.thighs,
            })
            .returning(MeasurementRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_measurement(row)
    }

    async fn find_for_owner(
        &self,
        owner: &UserId,
        measurement_id: Uuid,
    ) -> Result<Option<Measurement>, MeasurementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<MeasurementRow> = measurements::table
            .inner_join(challenges::table)
            .filter(measurements::id.eq(measurement_id))
            .filter(challenges::owner_id.eq(owner.as_ref()))
            .select(MeasurementRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_measurement).transpose()
    }

    async fn update(
        &self,
        owner: &UserId,
        measurement_id: Uuid,
        changes: &MeasurementChanges,
    ) -> Result<Measurement, MeasurementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owned = challenges::table
            .filter(challenges::owner_id.eq(owner.as_ref()))
            .select(challenges::id);

        let row: Option<MeasurementRow> = diesel::update(
            measurements::table
                .filter(measurements::id.eq(measurement_id))
                .filter(measurements::challenge_id.eq_any(owned)),
        )
        .set(&MeasurementUpdate::new(
            changes.day_number,
            changes.date,
            &changes.metrics,
            Utc::now(),
        ))
        .returning(MeasurementRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;

        row_to_measurement(row.ok_or_else(|| MeasurementRepositoryError::not_found(measurement_id))?)
    }

    async fn delete(
        &self,
        owner: &UserId,
        measurement_id: Uuid,
    ) -> Result<(), MeasurementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let owned = challenges::table
            .filter(challenges::owner_id.eq(owner.as_ref()))
            .select(challenges::id);

        let deleted = diesel::delete(
            measurements::table
                .filter(measurements::id.eq(measurement_id))
                .filter(measurements::challenge_id.eq_any(owned)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        if deleted == 0 {
            return Err(MeasurementRepositoryError::not_found(measurement_id));
        }
        Ok(())
    }
}
