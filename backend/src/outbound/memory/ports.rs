//! Repository port implementations for [`InMemoryStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::MutexGuard;
use uuid::Uuid;

use crate::domain::ports::{
    ChallengeRepository, ChallengeRepositoryError, DayLedgerRepository, DayLedgerRepositoryError,
    MeasurementRepository, MeasurementRepositoryError, RepositoryFailure, SectionRepository,
    SectionRepositoryError, TaskRepository, TaskRepositoryError,
};
use crate::domain::{
    CascadeError, CascadeStep, Challenge, ChallengeChanges, ChallengeDraft, ChallengeStatus,
    DayCompletion, DayEntry, DayRecord, DaySubmission, DayTarget, DayUpsertOutcome, Measurement,
    MeasurementChanges, MeasurementDraft, Section, SectionChanges, SectionDraft, SiblingOrder,
    SiblingParent, Task, TaskDraft, TaskRecord, TaskSettings, TaskType, UserId,
    delete_challenge_plan, delete_section_plan, delete_task_plan, plan_day_upsert, plan_insert,
    plan_move, reset_challenge_plan, resolve_day, run_cascade,
};

use super::{
    InMemoryStore, MemoryCascadeRunner, State, StepFailure, Tables, UNAVAILABLE_MESSAGE,
    Unavailable,
};

/// Working copy of the tables, committed explicitly.
struct Transaction<'s> {
    state: MutexGuard<'s, State>,
    working: Tables,
}

impl Transaction<'_> {
    async fn cascade(&mut self, plan: &[CascadeStep]) -> Result<u64, CascadeError<StepFailure>> {
        let mut runner = MemoryCascadeRunner::new(&mut self.working, self.state.fault);
        let result = run_cascade(&mut runner, plan).await;
        if runner.fired {
            self.state.fault = None;
        }
        result
    }

    fn commit(self) {
        let Self { mut state, working } = self;
        state.tables = working;
    }
}

impl InMemoryStore {
    async fn begin(&self) -> Result<Transaction<'_>, Unavailable> {
        let state = self.available().await?;
        let working = state.tables.clone();
        Ok(Transaction { state, working })
    }
}

fn unavailable<E: RepositoryFailure>(_: Unavailable) -> E {
    E::connection_failed(UNAVAILABLE_MESSAGE)
}

/// Translate a cascade failure, reporting a missing root with `not_found`.
fn cascade_error<E: RepositoryFailure>(
    error: CascadeError<StepFailure>,
    not_found: impl FnOnce() -> E,
) -> E {
    match error {
        CascadeError::NotFound { .. } => not_found(),
        CascadeError::Step(failure) => E::query_failed(failure.to_string()),
    }
}

#[async_trait]
impl ChallengeRepository for InMemoryStore {
    async fn create(&self, draft: &ChallengeDraft) -> Result<Challenge, ChallengeRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<ChallengeRepositoryError>)?;
        if tx.working.challenges.contains_key(&draft.id) {
            return Err(ChallengeRepositoryError::query("conflicting record"));
        }
        let now = Utc::now();
        let challenge = Challenge {
            id: draft.id,
            owner: draft.owner.clone(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            current_day: 1,
            status: ChallengeStatus::Active,
            created_at: now,
            updated_at: now,
        };
        tx.working.challenges.insert(challenge.id, challenge.clone());
        tx.commit();
        Ok(challenge)
    }

    async fn list_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Challenge>, ChallengeRepositoryError> {
        let state = self.available().await.map_err(unavailable::<ChallengeRepositoryError>)?;
        let mut challenges: Vec<_> = state
            .tables
            .challenges
            .values()
            .filter(|challenge| challenge.is_owned_by(owner))
            .cloned()
            .collect();
        challenges.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(challenges)
    }

    async fn find_for_owner(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Option<Challenge>, ChallengeRepositoryError> {
        let state = self.available().await.map_err(unavailable::<ChallengeRepositoryError>)?;
        Ok(state.tables.owned_challenge(owner, challenge_id).cloned())
    }

    async fn update(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
        changes: &ChallengeChanges,
    ) -> Result<Challenge, ChallengeRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<ChallengeRepositoryError>)?;
        let challenge = tx
            .working
            .challenges
            .get_mut(&challenge_id)
            .filter(|challenge| challenge.is_owned_by(owner))
            .ok_or_else(|| ChallengeRepositoryError::not_found(challenge_id))?;
        challenge.name = changes.name.clone();
        challenge.description = changes.description.clone();
        challenge.start_date = changes.start_date;
        challenge.end_date = changes.end_date;
        challenge.current_day = changes.current_day;
        challenge.status = changes.status;
        challenge.updated_at = Utc::now();
        let updated = challenge.clone();
        tx.commit();
        Ok(updated)
    }

    async fn delete_cascade(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<(), ChallengeRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<ChallengeRepositoryError>)?;
        if tx.working.owned_challenge(owner, challenge_id).is_none() {
            return Err(ChallengeRepositoryError::not_found(challenge_id));
        }
        let section_ids: Vec<_> = tx
            .working
            .sections_of(challenge_id)
            .iter()
            .map(|section| section.id)
            .collect();
        let day_record_ids: Vec<_> = tx
            .working
            .day_records_of(challenge_id)
            .iter()
            .map(|record| record.id)
            .collect();

        let plan = delete_challenge_plan(challenge_id, owner, &section_ids, &day_record_ids);
        tx.cascade(&plan).await.map_err(|err| {
            cascade_error(err, || ChallengeRepositoryError::not_found(challenge_id))
        })?;
        tx.commit();
        Ok(())
    }

    async fn reset(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Challenge, ChallengeRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<ChallengeRepositoryError>)?;
        if tx.working.owned_challenge(owner, challenge_id).is_none() {
            return Err(ChallengeRepositoryError::not_found(challenge_id));
        }
        let day_record_ids: Vec<_> = tx
            .working
            .day_records_of(challenge_id)
            .iter()
            .map(|record| record.id)
            .collect();

        let plan = reset_challenge_plan(challenge_id, owner, &day_record_ids);
        tx.cascade(&plan).await.map_err(|err| {
            cascade_error(err, || ChallengeRepositoryError::not_found(challenge_id))
        })?;
        let challenge = tx
            .working
            .challenges
            .get(&challenge_id)
            .cloned()
            .ok_or_else(|| ChallengeRepositoryError::not_found(challenge_id))?;
        tx.commit();
        Ok(challenge)
    }

    async fn day_completions(
        &self,
        challenge_id: Uuid,
    ) -> Result<Vec<DayCompletion>, ChallengeRepositoryError> {
        let state = self.available().await.map_err(unavailable::<ChallengeRepositoryError>)?;
        Ok(state
            .tables
            .day_records_of(challenge_id)
            .iter()
            .map(|record| DayCompletion::new(record.day_number, record.completed))
            .collect())
    }
}

#[async_trait]
impl SectionRepository for InMemoryStore {
    async fn list(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Vec<Section>, SectionRepositoryError> {
        let state = self.available().await.map_err(unavailable::<SectionRepositoryError>)?;
        if state.tables.owned_challenge(owner, challenge_id).is_none() {
            return Err(SectionRepositoryError::challenge_not_found(challenge_id));
        }
        Ok(state.tables.sections_of(challenge_id))
    }

    async fn create(
        &self,
        owner: &UserId,
        draft: &SectionDraft,
    ) -> Result<Section, SectionRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<SectionRepositoryError>)?;
        let challenge_id = draft.challenge_id;
        if tx.working.owned_challenge(owner, challenge_id).is_none() {
            return Err(SectionRepositoryError::challenge_not_found(challenge_id));
        }

        let parent = SiblingParent::Challenge(challenge_id);
        let plan = plan_insert(tx.working.max_order(parent), draft.position);
        if let Some(shift) = plan.shift {
            tx.working
                .shift_siblings(parent, shift)
                .map_err(|err| SectionRepositoryError::query(err.to_string()))?;
        }

        let now = Utc::now();
        let section = Section {
            id: draft.id,
            challenge_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            order: plan.position,
            created_at: now,
            updated_at: now,
        };
        tx.working.sections.insert(section.id, section.clone());
        tx.commit();
        Ok(section)
    }

    async fn update(
        &self,
        owner: &UserId,
        section_id: Uuid,
        changes: &SectionChanges,
    ) -> Result<Section, SectionRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<SectionRepositoryError>)?;
        if tx.working.owned_section(owner, section_id).is_none() {
            return Err(SectionRepositoryError::not_found(section_id));
        }
        let section = tx
            .working
            .sections
            .get_mut(&section_id)
            .ok_or_else(|| SectionRepositoryError::not_found(section_id))?;
        section.name = changes.name.clone();
        section.description = changes.description.clone();
        section.updated_at = Utc::now();
        let updated = section.clone();
        tx.commit();
        Ok(updated)
    }

    async fn move_to(
        &self,
        owner: &UserId,
        section_id: Uuid,
        target: SiblingOrder,
    ) -> Result<Section, SectionRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<SectionRepositoryError>)?;
        let current = tx
            .working
            .owned_section(owner, section_id)
            .cloned()
            .ok_or_else(|| SectionRepositoryError::not_found(section_id))?;
        let Some(plan) = plan_move(current.order, target) else {
            return Ok(current);
        };

        tx.working
            .shift_siblings(SiblingParent::Challenge(current.challenge_id), plan.shift)
            .map_err(|err| SectionRepositoryError::query(err.to_string()))?;
        let section = tx
            .working
            .sections
            .get_mut(&section_id)
            .ok_or_else(|| SectionRepositoryError::not_found(section_id))?;
        section.order = plan.target;
        section.updated_at = Utc::now();
        let moved = section.clone();
        tx.commit();
        Ok(moved)
    }

    async fn delete(&self, owner: &UserId, section_id: Uuid) -> Result<(), SectionRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<SectionRepositoryError>)?;
        let section = tx
            .working
            .owned_section(owner, section_id)
            .cloned()
            .ok_or_else(|| SectionRepositoryError::not_found(section_id))?;
        let task_ids: Vec<_> = tx
            .working
            .tasks_of(section_id)
            .iter()
            .map(|task| task.id)
            .collect();

        let plan = delete_section_plan(&section, &task_ids);
        tx.cascade(&plan).await.map_err(|err| {
            cascade_error(err, || SectionRepositoryError::not_found(section_id))
        })?;
        tx.commit();
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn list(&self, owner: &UserId, section_id: Uuid) -> Result<Vec<Task>, TaskRepositoryError> {
        let state = self.available().await.map_err(unavailable::<TaskRepositoryError>)?;
        if state.tables.owned_section(owner, section_id).is_none() {
            return Err(TaskRepositoryError::section_not_found(section_id));
        }
        Ok(state.tables.tasks_of(section_id))
    }

    async fn create(&self, owner: &UserId, draft: &TaskDraft) -> Result<Task, TaskRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<TaskRepositoryError>)?;
        let section_id = draft.section_id;
        if tx.working.owned_section(owner, section_id).is_none() {
            return Err(TaskRepositoryError::section_not_found(section_id));
        }

        let parent = SiblingParent::Section(section_id);
        let plan = plan_insert(tx.working.max_order(parent), draft.position);
        if let Some(shift) = plan.shift {
            tx.working
                .shift_siblings(parent, shift)
                .map_err(|err| TaskRepositoryError::query(err.to_string()))?;
        }

        let now = Utc::now();
        let settings = &draft.settings;
        let task = Task {
            id: draft.id,
            section_id,
            name: settings.name.clone(),
            description: settings.description.clone(),
            task_type: settings.task_type,
            required: settings.required,
            restart_on_fail: settings.restart_on_fail,
            strikes: settings.strikes,
            order: plan.position,
            created_at: now,
            updated_at: now,
        };
        tx.working.tasks.insert(task.id, task.clone());
        tx.commit();
        Ok(task)
    }

    async fn update(
        &self,
        owner: &UserId,
        task_id: Uuid,
        settings: &TaskSettings,
    ) -> Result<Task, TaskRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<TaskRepositoryError>)?;
        if tx.working.owned_task(owner, task_id).is_none() {
            return Err(TaskRepositoryError::not_found(task_id));
        }
        let task = tx
            .working
            .tasks
            .get_mut(&task_id)
            .ok_or_else(|| TaskRepositoryError::not_found(task_id))?;
        task.name = settings.name.clone();
        task.description = settings.description.clone();
        task.task_type = settings.task_type;
        task.required = settings.required;
        task.restart_on_fail = settings.restart_on_fail;
        task.strikes = settings.strikes;
        task.updated_at = Utc::now();
        let updated = task.clone();
        tx.commit();
        Ok(updated)
    }

    async fn move_to(
        &self,
        owner: &UserId,
        task_id: Uuid,
        target: SiblingOrder,
    ) -> Result<Task, TaskRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<TaskRepositoryError>)?;
        let current = tx
            .working
            .owned_task(owner, task_id)
            .cloned()
            .ok_or_else(|| TaskRepositoryError::not_found(task_id))?;
        let Some(plan) = plan_move(current.order, target) else {
            return Ok(current);
        };

        tx.working
            .shift_siblings(SiblingParent::Section(current.section_id), plan.shift)
            .map_err(|err| TaskRepositoryError::query(err.to_string()))?;
        let task = tx
            .working
            .tasks
            .get_mut(&task_id)
            .ok_or_else(|| TaskRepositoryError::not_found(task_id))?;
        task.order = plan.target;
        task.updated_at = Utc::now();
        let moved = task.clone();
        tx.commit();
        Ok(moved)
    }

    async fn delete(&self, owner: &UserId, task_id: Uuid) -> Result<(), TaskRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<TaskRepositoryError>)?;
        let task = tx
            .working
            .owned_task(owner, task_id)
            .cloned()
            .ok_or_else(|| TaskRepositoryError::not_found(task_id))?;

        let plan = delete_task_plan(&task);
        tx.cascade(&plan).await.map_err(|err| {
            cascade_error(err, || TaskRepositoryError::not_found(task_id))
        })?;
        tx.commit();
        Ok(())
    }
}

impl Tables {
    fn task_types_of(&self, challenge_id: Uuid) -> HashMap<Uuid, TaskType> {
        self.tasks
            .values()
            .filter(|task| {
                self.sections
                    .get(&task.section_id)
                    .is_some_and(|section| section.challenge_id == challenge_id)
            })
            .map(|task| (task.id, task.task_type))
            .collect()
    }

    fn day_record(&self, challenge_id: Uuid, day_number: u32) -> Option<&DayRecord> {
        self.day_records
            .values()
            .find(|record| record.challenge_id == challenge_id && record.day_number == day_number)
    }
}

#[async_trait]
impl DayLedgerRepository for InMemoryStore {
    async fn list(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Vec<DayRecord>, DayLedgerRepositoryError> {
        let state = self.available().await.map_err(unavailable::<DayLedgerRepositoryError>)?;
        if state.tables.owned_challenge(owner, challenge_id).is_none() {
            return Err(DayLedgerRepositoryError::challenge_not_found(challenge_id));
        }
        Ok(state.tables.day_records_of(challenge_id))
    }

    async fn find_by_day(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
        day_number: u32,
    ) -> Result<Option<DayEntry>, DayLedgerRepositoryError> {
        let state = self.available().await.map_err(unavailable::<DayLedgerRepositoryError>)?;
        let tables = &state.tables;
        if tables.owned_challenge(owner, challenge_id).is_none() {
            return Err(DayLedgerRepositoryError::challenge_not_found(challenge_id));
        }
        Ok(tables
            .day_record(challenge_id, day_number)
            .cloned()
            .map(|record| tables.entry(record)))
    }

    async fn upsert(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
        target: DayTarget,
        submission: &DaySubmission,
        recorded_at: DateTime<Utc>,
    ) -> Result<DayUpsertOutcome, DayLedgerRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<DayLedgerRepositoryError>)?;
        let tables = &mut tx.working;
        let challenge = tables
            .owned_challenge(owner, challenge_id)
            .cloned()
            .ok_or_else(|| DayLedgerRepositoryError::challenge_not_found(challenge_id))?;
        let day_number = resolve_day(&challenge, target).map_err(DayLedgerRepositoryError::rejected)?;
        let existing = tables.day_record(challenge_id, day_number).map(|record| record.id);
        let plan = plan_day_upsert(
            &challenge,
            day_number,
            existing.is_some(),
            submission,
            &tables.task_types_of(challenge_id),
        )
        .map_err(DayLedgerRepositoryError::rejected)?;

        let now = Utc::now();
        let record_id = existing.unwrap_or_else(Uuid::new_v4);
        let record = tables
            .day_records
            .entry(record_id)
            .or_insert_with(|| DayRecord {
                id: record_id,
                challenge_id,
                day_number,
                date: recorded_at,
                completed: false,
                notes: String::new(),
                progress_photo_url: None,
                energy_level: None,
                mood_level: None,
                created_at: now,
                updated_at: now,
            });
        record.completed = submission.completed;
        record.notes = submission.notes.clone();
        record.progress_photo_url = submission.progress_photo_url.clone();
        record.energy_level = submission.energy_level;
        record.mood_level = submission.mood_level;
        record.updated_at = now;
        let record = record.clone();

        for validated in plan.task_records {
            let current = tables.task_records.values_mut().find(|task_record| {
                task_record.day_record_id == record_id && task_record.task_id == validated.task_id
            });
            match current {
                Some(task_record) => {
                    task_record.completed = validated.completed;
                    task_record.value = validated.value;
                    task_record.notes = validated.notes;
                    task_record.updated_at = now;
                }
                None => {
                    let id = Uuid::new_v4();
                    tables.task_records.insert(
                        id,
                        TaskRecord {
                            id,
                            day_record_id: record_id,
                            task_id: validated.task_id,
                            completed: validated.completed,
                            value: validated.value,
                            notes: validated.notes,
                            created_at: now,
                            updated_at: now,
                        },
                    );
                }
            }
        }

        if let Some(next_day) = plan.advance_to {
            if let Some(stored) = tables.challenges.get_mut(&challenge_id) {
                stored.current_day = next_day;
                stored.updated_at = now;
            }
        }

        let entry = tables.entry(record);
        tx.commit();
        Ok(DayUpsertOutcome {
            entry,
            created: existing.is_none(),
            advanced_to: plan.advance_to,
        })
    }
}

#[async_trait]
impl MeasurementRepository for InMemoryStore {
    async fn list(
        &self,
        owner: &UserId,
        challenge_id: Uuid,
    ) -> Result<Vec<Measurement>, MeasurementRepositoryError> {
        let state = self.available().await.map_err(unavailable::<MeasurementRepositoryError>)?;
        if state.tables.owned_challenge(owner, challenge_id).is_none() {
            return Err(MeasurementRepositoryError::challenge_not_found(challenge_id));
        }
        let mut measurements: Vec<_> = state
            .tables
            .measurements
            .values()
            .filter(|measurement| measurement.challenge_id == challenge_id)
            .cloned()
            .collect();
        measurements.sort_by_key(|measurement| (measurement.day_number, measurement.created_at));
        Ok(measurements)
    }

    async fn create(
        &self,
        owner: &UserId,
        draft: &MeasurementDraft,
    ) -> Result<Measurement, MeasurementRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<MeasurementRepositoryError>)?;
        if tx.working.owned_challenge(owner, draft.challenge_id).is_none() {
            return Err(MeasurementRepositoryError::challenge_not_found(
                draft.challenge_id,
            ));
        }
        let now = Utc::now();
        let measurement = Measurement {
            id: draft.id,
            challenge_id: draft.challenge_id,
            day_number: draft.day_number,
            date: draft.date,
            metrics: draft.metrics,
            created_at: now,
            updated_at: now,
        };
        tx.working
            .measurements
            .insert(measurement.id, measurement.clone());
        tx.commit();
        Ok(measurement)
    }

    async fn find_for_owner(
        &self,
        owner: &UserId,
        measurement_id: Uuid,
    ) -> Result<Option<Measurement>, MeasurementRepositoryError> {
        let state = self.available().await.map_err(unavailable::<MeasurementRepositoryError>)?;
        Ok(state.tables.owned_measurement(owner, measurement_id).cloned())
    }

    async fn update(
        &self,
        owner: &UserId,
        measurement_id: Uuid,
        changes: &MeasurementChanges,
    ) -> Result<Measurement, MeasurementRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<MeasurementRepositoryError>)?;
        if tx.working.owned_measurement(owner, measurement_id).is_none() {
            return Err(MeasurementRepositoryError::not_found(measurement_id));
        }
        let measurement = tx
            .working
            .measurements
            .get_mut(&measurement_id)
            .ok_or_else(|| MeasurementRepositoryError::not_found(measurement_id))?;
        measurement.day_number = changes.day_number;
        measurement.date = changes.date;
        measurement.metrics = changes.metrics;
        measurement.updated_at = Utc::now();
        let updated = measurement.clone();
        tx.commit();
        Ok(updated)
    }

    async fn delete(
        &self,
        owner: &UserId,
        measurement_id: Uuid,
    ) -> Result<(), MeasurementRepositoryError> {
        let mut tx = self.begin().await.map_err(unavailable::<MeasurementRepositoryError>)?;
        if tx.working.owned_measurement(owner, measurement_id).is_none() {
            return Err(MeasurementRepositoryError::not_found(measurement_id));
        }
        tx.working.measurements.remove(&measurement_id);
        tx.commit();
        Ok(())
    }
}
