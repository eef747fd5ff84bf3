//! Cascade coordinator for multi-table deletes and resets.
//!
//! Storage carries no declarative cascade rules, so dependent rows are
//! removed by an explicit, ordered list of [`CascadeStep`]s. Plans are built
//! here from the identifiers an adapter enumerated inside its transaction;
//! [`run_cascade`] then feeds them one by one to the adapter's
//! [`CascadeStepRunner`]. The first failing step aborts the run and the
//! adapter rolls back the whole transaction.
//!
//! Steps that remove or restart the cascade's root are guarded: when they
//! affect no rows the root vanished or belongs to someone else, and the run
//! stops with [`CascadeError::NotFound`].

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::{OrderShift, Section, Task, UserId, plan_removal};

/// Parent key of an ordered sibling set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingParent {
    /// Sections of a challenge.
    Challenge(Uuid),
    /// Tasks of a section.
    Section(Uuid),
}

/// One statement of a cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeStep {
    /// Delete every task of a section.
    DeleteTasksOfSection { section_id: Uuid },
    /// Delete the task records attached to one day record.
    DeleteTaskRecordsOfDayRecord { day_record_id: Uuid },
    /// Delete the task records of one task across all days.
    DeleteTaskRecordsOfTask { task_id: Uuid },
    /// Delete every day record of a challenge.
    DeleteDayRecords { challenge_id: Uuid },
    /// Delete every measurement of a challenge.
    DeleteMeasurements { challenge_id: Uuid },
    /// Delete every section of a challenge.
    DeleteSections { challenge_id: Uuid },
    /// Owner-guarded delete of the challenge row.
    DeleteChallenge { challenge_id: Uuid, owner: UserId },
    /// Owner-guarded `current_day = 1, status = active`.
    RestartChallenge { challenge_id: Uuid, owner: UserId },
    /// Delete one section row.
    DeleteSection { section_id: Uuid },
    /// Delete one task row.
    DeleteTask { task_id: Uuid },
    /// Close the gap left by a removed sibling.
    CompactSiblings {
        parent: SiblingParent,
        shift: OrderShift,
    },
}

/// Fieldless discriminant of [`CascadeStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeStepKind {
    /// [`CascadeStep::DeleteTasksOfSection`].
    DeleteTasksOfSection,
    /// [`CascadeStep::DeleteTaskRecordsOfDayRecord`].
    DeleteTaskRecordsOfDayRecord,
    /// [`CascadeStep::DeleteTaskRecordsOfTask`].
    DeleteTaskRecordsOfTask,
    /// [`CascadeStep::DeleteDayRecords`].
    DeleteDayRecords,
    /// [`CascadeStep::DeleteMeasurements`].
    DeleteMeasurements,
    /// [`CascadeStep::DeleteSections`].
    DeleteSections,
    /// [`CascadeStep::DeleteChallenge`].
    DeleteChallenge,
    /// [`CascadeStep::RestartChallenge`].
    RestartChallenge,
    /// [`CascadeStep::DeleteSection`].
    DeleteSection,
    /// [`CascadeStep::DeleteTask`].
    DeleteTask,
    /// [`CascadeStep::CompactSiblings`].
    CompactSiblings,
}

impl CascadeStep {
    /// Discriminant used for fault injection and logging.
    pub fn kind(&self) -> CascadeStepKind {
        match self {
            Self::DeleteTasksOfSection { .. } => CascadeStepKind::DeleteTasksOfSection,
            Self::DeleteTaskRecordsOfDayRecord { .. } => {
                CascadeStepKind::DeleteTaskRecordsOfDayRecord
            }
            Self::DeleteTaskRecordsOfTask { .. } => CascadeStepKind::DeleteTaskRecordsOfTask,
            Self::DeleteDayRecords { .. } => CascadeStepKind::DeleteDayRecords,
            Self::DeleteMeasurements { .. } => CascadeStepKind::DeleteMeasurements,
            Self::DeleteSections { .. } => CascadeStepKind::DeleteSections,
            Self::DeleteChallenge { .. } => CascadeStepKind::DeleteChallenge,
            Self::RestartChallenge { .. } => CascadeStepKind::RestartChallenge,
            Self::DeleteSection { .. } => CascadeStepKind::DeleteSection,
            Self::DeleteTask { .. } => CascadeStepKind::DeleteTask,
            Self::CompactSiblings { .. } => CascadeStepKind::CompactSiblings,
        }
    }

    /// Whether affecting zero rows means the cascade's root is missing.
    pub fn is_guarded(&self) -> bool {
        matches!(
            self.kind(),
            CascadeStepKind::DeleteChallenge
                | CascadeStepKind::RestartChallenge
                | CascadeStepKind::DeleteSection
                | CascadeStepKind::DeleteTask
        )
    }
}

/// Delete a challenge and everything beneath it.
///
/// Order: tasks per section, task records per day record, day records,
/// measurements, sections, then the owner-guarded challenge row.
pub fn delete_challenge_plan(
    challenge_id: Uuid,
    owner: &UserId,
    section_ids: &[Uuid],
    day_record_ids: &[Uuid],
) -> Vec<CascadeStep> {
    let mut steps = Vec::with_capacity(section_ids.len() + day_record_ids.len() + 4);
    steps.extend(
        section_ids
            .iter()
            .map(|&section_id| CascadeStep::DeleteTasksOfSection { section_id }),
    );
    steps.extend(
        day_record_ids
            .iter()
            .map(|&day_record_id| CascadeStep::DeleteTaskRecordsOfDayRecord { day_record_id }),
    );
    steps.extend([
        CascadeStep::DeleteDayRecords { challenge_id },
        CascadeStep::DeleteMeasurements { challenge_id },
        CascadeStep::DeleteSections { challenge_id },
        CascadeStep::DeleteChallenge {
            challenge_id,
            owner: owner.clone(),
        },
    ]);
    steps
}

/// Restart a challenge from day one, discarding its ledger.
///
/// Sections, tasks and measurements are untouched.
pub fn reset_challenge_plan(
    challenge_id: Uuid,
    owner: &UserId,
    day_record_ids: &[Uuid],
) -> Vec<CascadeStep> {
    let mut steps = Vec::with_capacity(day_record_ids.len() + 2);
    steps.push(CascadeStep::RestartChallenge {
        challenge_id,
        owner: owner.clone(),
    });
    steps.extend(
        day_record_ids
            .iter()
            .map(|&day_record_id| CascadeStep::DeleteTaskRecordsOfDayRecord { day_record_id }),
    );
    steps.push(CascadeStep::DeleteDayRecords { challenge_id });
    steps
}

/// Delete a section with its tasks and their task records, then compact
/// the remaining sections.
pub fn delete_section_plan(section: &Section, task_ids: &[Uuid]) -> Vec<CascadeStep> {
    let mut steps: Vec<_> = task_ids
        .iter()
        .map(|&task_id| CascadeStep::DeleteTaskRecordsOfTask { task_id })
        .collect();
    steps.extend([
        CascadeStep::DeleteTasksOfSection {
            section_id: section.id,
        },
        CascadeStep::DeleteSection {
            section_id: section.id,
        },
        CascadeStep::CompactSiblings {
            parent: SiblingParent::Challenge(section.challenge_id),
            shift: plan_removal(section.order),
        },
    ]);
    steps
}

/// Delete a task with its task records, then compact the remaining tasks.
pub fn delete_task_plan(task: &Task) -> Vec<CascadeStep> {
    vec![
        CascadeStep::DeleteTaskRecordsOfTask { task_id: task.id },
        CascadeStep::DeleteTask { task_id: task.id },
        CascadeStep::CompactSiblings {
            parent: SiblingParent::Section(task.section_id),
            shift: plan_removal(task.order),
        },
    ]
}

/// Executes individual cascade steps inside an open transaction.
#[async_trait]
pub trait CascadeStepRunner: Send {
    type Error: Send;

    /// Execute `step`, returning the number of affected rows.
    async fn run(&mut self, step: &CascadeStep) -> Result<u64, Self::Error>;
}

/// Failure of a cascade run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeError<E> {
    /// A guarded step affected no rows.
    NotFound { step: CascadeStepKind },
    /// The runner failed.
    Step(E),
}

/// Execute `steps` in order, stopping at the first failure.
///
/// Returns the total number of affected rows.
pub async fn run_cascade<R>(runner: &mut R, steps: &[CascadeStep]) -> Result<u64, CascadeError<R::Error>>
where
    R: CascadeStepRunner + ?Sized,
{
    let mut affected = 0_u64;
    for step in steps {
        let rows = runner.run(step).await.map_err(CascadeError::Step)?;
        debug!(step = ?step.kind(), rows, "cascade step applied");
        if rows == 0 && step.is_guarded() {
            return Err(CascadeError::NotFound { step: step.kind() });
        }
        affected = affected.saturating_add(rows);
    }
    Ok(affected)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for cascade planning and execution.
    use chrono::Utc;
    use rstest::rstest;

    use super::*;
    use crate::domain::{EntityName, SiblingOrder, StrikesPolicy, TaskType};

    /// Records executed steps and fails or misses on request.
    #[derive(Default)]
    struct ScriptedRunner {
        executed: Vec<CascadeStepKind>,
        fail_on: Option<usize>,
        miss: Option<CascadeStepKind>,
    }

    #[async_trait]
    impl CascadeStepRunner for ScriptedRunner {
        type Error = &'static str;

        async fn run(&mut self, step: &CascadeStep) -> Result<u64, Self::Error> {
            if self.fail_on == Some(self.executed.len()) {
                return Err("boom");
            }
            self.executed.push(step.kind());
            if self.miss == Some(step.kind()) {
                return Ok(0);
            }
            Ok(1)
        }
    }

    fn section() -> Section {
        let now = Utc::now();
        Section {
            id: Uuid::new_v4(),
            challenge_id: Uuid::new_v4(),
            name: EntityName::new("Fitness").expect("valid name"),
            description: String::new(),
            order: SiblingOrder::new(2).expect("valid order"),
            created_at: now,
            updated_at: now,
        }
    }

    fn task(section_id: Uuid) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            section_id,
            name: EntityName::new("Outdoor workout").expect("valid name"),
            description: String::new(),
            task_type: TaskType::Boolean,
            required: true,
            restart_on_fail: false,
            strikes: StrikesPolicy::disabled(),
            order: SiblingOrder::new(3).expect("valid order"),
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn delete_challenge_removes_dependents_before_the_root() {
        let owner = UserId::random();
        let steps = delete_challenge_plan(
            Uuid::new_v4(),
            &owner,
            &[Uuid::new_v4(), Uuid::new_v4()],
            &[Uuid::new_v4()],
        );

        let kinds: Vec<_> = steps.iter().map(CascadeStep::kind).collect();
        assert_eq!(
            kinds,
            vec![
                CascadeStepKind::DeleteTasksOfSection,
                CascadeStepKind::DeleteTasksOfSection,
                CascadeStepKind::DeleteTaskRecordsOfDayRecord,
                CascadeStepKind::DeleteDayRecords,
                CascadeStepKind::DeleteMeasurements,
                CascadeStepKind::DeleteSections,
                CascadeStepKind::DeleteChallenge,
            ]
        );
    }

    #[rstest]
    fn reset_leaves_structure_and_measurements_alone() {
        let steps = reset_challenge_plan(Uuid::new_v4(), &UserId::random(), &[Uuid::new_v4()]);

        assert!(steps.iter().all(|step| !matches!(
            step.kind(),
            CascadeStepKind::DeleteMeasurements
                | CascadeStepKind::DeleteSections
                | CascadeStepKind::DeleteTasksOfSection
        )));
        assert_eq!(steps.first().map(CascadeStep::kind), Some(CascadeStepKind::RestartChallenge));
    }

    #[rstest]
    fn delete_section_compacts_from_the_removed_order() {
        let section = section();
        let steps = delete_section_plan(&section, &[Uuid::new_v4()]);

        let Some(CascadeStep::CompactSiblings { parent, shift }) = steps.last() else {
            panic!("expected trailing compaction, got {steps:?}");
        };
        assert_eq!(*parent, SiblingParent::Challenge(section.challenge_id));
        assert_eq!(shift.lowest(), 3);
        assert_eq!(shift.highest(), None);
    }

    #[rstest]
    fn delete_task_clears_records_first() {
        let task = task(Uuid::new_v4());
        let kinds: Vec<_> = delete_task_plan(&task).iter().map(CascadeStep::kind).collect();

        assert_eq!(
            kinds,
            vec![
                CascadeStepKind::DeleteTaskRecordsOfTask,
                CascadeStepKind::DeleteTask,
                CascadeStepKind::CompactSiblings,
            ]
        );
    }

    #[tokio::test]
    async fn run_stops_at_first_failure() {
        let steps = delete_challenge_plan(Uuid::new_v4(), &UserId::random(), &[], &[Uuid::new_v4()]);
        let mut runner = ScriptedRunner {
            fail_on: Some(1),
            ..ScriptedRunner::default()
        };

        let result = run_cascade(&mut runner, &steps).await;

        assert_eq!(result, Err(CascadeError::Step("boom")));
        assert_eq!(runner.executed.len(), 1);
    }

    #[tokio::test]
    async fn guarded_step_without_rows_is_not_found() {
        let steps = delete_challenge_plan(Uuid::new_v4(), &UserId::random(), &[], &[]);
        let mut runner = ScriptedRunner {
            miss: Some(CascadeStepKind::DeleteChallenge),
            ..ScriptedRunner::default()
        };

        let result = run_cascade(&mut runner, &steps).await;

        assert_eq!(
            result,
            Err(CascadeError::NotFound {
                step: CascadeStepKind::DeleteChallenge
            })
        );
    }

    #[tokio::test]
    async fn unguarded_steps_may_affect_nothing() {
        let steps = reset_challenge_plan(Uuid::new_v4(), &UserId::random(), &[]);
        let mut runner = ScriptedRunner {
            miss: Some(CascadeStepKind::DeleteDayRecords),
            ..ScriptedRunner::default()
        };

        let affected = run_cascade(&mut runner, &steps).await.expect("cascade succeeds");

        assert_eq!(affected, 1);
    }
}
