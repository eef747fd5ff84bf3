//! In-memory implementation of every repository port.
//!
//! [`InMemoryStore`] keeps the six tables behind one async mutex. Each
//! mutating operation works on a copy of the tables and swaps it in only when
//! every step succeeded, so a failed cascade leaves the previous state
//! intact exactly like a rolled-back database transaction.
//!
//! The store backs local runs without a database and the HTTP integration
//! suites. [`InMemoryStore::fail_on`] and [`InMemoryStore::set_unavailable`]
//! inject faults for rollback and outage scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::{
    CascadeStep, CascadeStepKind, CascadeStepRunner, Challenge, ChallengeStatus, DayEntry, DayRecord,
    Measurement, OrderShift, OrderingError, Section, SiblingOrder, SiblingParent, Task,
    TaskRecord, UserId,
};

mod ports;

/// Row counts per table, for asserting on cascades and rollbacks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub challenges: usize,
    pub sections: usize,
    pub tasks: usize,
    pub day_records: usize,
    pub task_records: usize,
    pub measurements: usize,
}

#[derive(Debug, Default, Clone)]
struct Tables {
    challenges: HashMap<Uuid, Challenge>,
    sections: HashMap<Uuid, Section>,
    tasks: HashMap<Uuid, Task>,
    day_records: HashMap<Uuid, DayRecord>,
    task_records: HashMap<Uuid, TaskRecord>,
    measurements: HashMap<Uuid, Measurement>,
}

/// Scheduled failure of the `occurrence`-th step of `kind` in a cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepFault {
    kind: CascadeStepKind,
    occurrence: usize,
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    unavailable: bool,
    fault: Option<StepFault>,
}

/// The store refused a request because it was marked unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Unavailable;

const UNAVAILABLE_MESSAGE: &str = "in-memory store marked unavailable";

/// Transactional in-memory store.
///
/// Clones share the same tables.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `occurrence`-th (1-based) step of `kind` in the next cascade
    /// that reaches it. The fault fires once.
    pub async fn fail_on(&self, kind: CascadeStepKind, occurrence: usize) {
        self.state.lock().await.fault = Some(StepFault { kind, occurrence });
    }

    /// Make every operation fail with a connection error until reset.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().await.unavailable = unavailable;
    }

    /// Current number of rows in each table.
    pub async fn counts(&self) -> TableCounts {
        let state = self.state.lock().await;
        let tables = &state.tables;
        TableCounts {
            challenges: tables.challenges.len(),
            sections: tables.sections.len(),
            tasks: tables.tasks.len(),
            day_records: tables.day_records.len(),
            task_records: tables.task_records.len(),
            measurements: tables.measurements.len(),
        }
    }

    async fn available(&self) -> Result<MutexGuard<'_, State>, Unavailable> {
        let state = self.state.lock().await;
        if state.unavailable {
            return Err(Unavailable);
        }
        Ok(state)
    }
}

impl Tables {
    fn owned_challenge(&self, owner: &UserId, challenge_id: Uuid) -> Option<&Challenge> {
        self.challenges
            .get(&challenge_id)
            .filter(|challenge| challenge.is_owned_by(owner))
    }

    fn owned_section(&self, owner: &UserId, section_id: Uuid) -> Option<&Section> {
        self.sections
            .get(&section_id)
            .filter(|section| self.owned_challenge(owner, section.challenge_id).is_some())
    }

    fn owned_task(&self, owner: &UserId, task_id: Uuid) -> Option<&Task> {
        self.tasks
            .get(&task_id)
            .filter(|task| self.owned_section(owner, task.section_id).is_some())
    }

    fn owned_measurement(&self, owner: &UserId, measurement_id: Uuid) -> Option<&Measurement> {
        self.measurements
            .get(&measurement_id)
            .filter(|measurement| self.owned_challenge(owner, measurement.challenge_id).is_some())
    }

    fn sections_of(&self, challenge_id: Uuid) -> Vec<Section> {
        let mut sections: Vec<_> = self
            .sections
            .values()
            .filter(|section| section.challenge_id == challenge_id)
            .cloned()
            .collect();
        sections.sort_by_key(|section| section.order);
        sections
    }

    fn tasks_of(&self, section_id: Uuid) -> Vec<Task> {
        let mut tasks: Vec<_> = self
            .tasks
            .values()
            .filter(|task| task.section_id == section_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.order);
        tasks
    }

    fn day_records_of(&self, challenge_id: Uuid) -> Vec<DayRecord> {
        let mut records: Vec<_> = self
            .day_records
            .values()
            .filter(|record| record.challenge_id == challenge_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.day_number);
        records
    }

    fn max_order(&self, parent: SiblingParent) -> Option<SiblingOrder> {
        match parent {
            SiblingParent::Challenge(challenge_id) => self
                .sections
                .values()
                .filter(|section| section.challenge_id == challenge_id)
                .map(|section| section.order)
                .max(),
            SiblingParent::Section(section_id) => self
                .tasks
                .values()
                .filter(|task| task.section_id == section_id)
                .map(|task| task.order)
                .max(),
        }
    }

    /// Apply `shift` to every sibling under `parent`.
    fn shift_siblings(
        &mut self,
        parent: SiblingParent,
        shift: OrderShift,
    ) -> Result<u64, OrderingError> {
        let now = Utc::now();
        let mut affected = 0_u64;
        match parent {
            SiblingParent::Challenge(challenge_id) => {
                for section in self.sections.values_mut() {
                    if section.challenge_id == challenge_id && shift.contains(section.order.get()) {
                        section.order = shifted(section.order, shift)?;
                        section.updated_at = now;
                        affected += 1;
                    }
                }
            }
            SiblingParent::Section(section_id) => {
                for task in self.tasks.values_mut() {
                    if task.section_id == section_id && shift.contains(task.order.get()) {
                        task.order = shifted(task.order, shift)?;
                        task.updated_at = now;
                        affected += 1;
                    }
                }
            }
        }
        Ok(affected)
    }

    /// The day record with its task records ordered by section, then task.
    fn entry(&self, record: DayRecord) -> DayEntry {
        let position = |task_id: &Uuid| {
            self.tasks.get(task_id).map_or((u32::MAX, u32::MAX), |task| {
                let section = self
                    .sections
                    .get(&task.section_id)
                    .map_or(u32::MAX, |section| section.order.get());
                (section, task.order.get())
            })
        };
        let mut task_records: Vec<_> = self
            .task_records
            .values()
            .filter(|task_record| task_record.day_record_id == record.id)
            .cloned()
            .collect();
        task_records.sort_by_key(|task_record| position(&task_record.task_id));
        DayEntry {
            record,
            task_records,
        }
    }
}

fn shifted(order: SiblingOrder, shift: OrderShift) -> Result<SiblingOrder, OrderingError> {
    SiblingOrder::new(i64::from(shift.apply(order.get())))
}

fn remove_where<V>(rows: &mut HashMap<Uuid, V>, doomed: impl Fn(&V) -> bool) -> u64 {
    let before = rows.len();
    rows.retain(|_, row| !doomed(row));
    u64::try_from(before.saturating_sub(rows.len())).unwrap_or(u64::MAX)
}

/// Failure raised while applying a cascade step to the tables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
enum StepFailure {
    #[error("injected failure at {step:?}")]
    Injected { step: CascadeStepKind },
    #[error(transparent)]
    Order(#[from] OrderingError),
}

/// Applies cascade steps to a working copy of the tables.
struct MemoryCascadeRunner<'t> {
    tables: &'t mut Tables,
    fault: Option<StepFault>,
    seen: usize,
    fired: bool,
}

impl<'t> MemoryCascadeRunner<'t> {
    fn new(tables: &'t mut Tables, fault: Option<StepFault>) -> Self {
        Self {
            tables,
            fault,
            seen: 0,
            fired: false,
        }
    }

    fn check_fault(&mut self, kind: CascadeStepKind) -> Result<(), StepFailure> {
        let Some(fault) = self.fault.filter(|fault| fault.kind == kind) else {
            return Ok(());
        };
        self.seen += 1;
        if self.seen == fault.occurrence {
            self.fired = true;
            return Err(StepFailure::Injected { step: kind });
        }
        Ok(())
    }

    fn apply(&mut self, step: &CascadeStep) -> Result<u64, StepFailure> {
        let tables = &mut *self.tables;
        let rows = match step {
            CascadeStep::DeleteTasksOfSection { section_id } => {
                remove_where(&mut tables.tasks, |task| task.section_id == *section_id)
            }
            CascadeStep::DeleteTaskRecordsOfDayRecord { day_record_id } => {
                remove_where(&mut tables.task_records, |record| {
                    record.day_record_id == *day_record_id
                })
            }
            CascadeStep::DeleteTaskRecordsOfTask { task_id } => {
                remove_where(&mut tables.task_records, |record| record.task_id == *task_id)
            }
            CascadeStep::DeleteDayRecords { challenge_id } => {
                remove_where(&mut tables.day_records, |record| {
                    record.challenge_id == *challenge_id
                })
            }
            CascadeStep::DeleteMeasurements { challenge_id } => {
                remove_where(&mut tables.measurements, |measurement| {
                    measurement.challenge_id == *challenge_id
                })
            }
            CascadeStep::DeleteSections { challenge_id } => {
                remove_where(&mut tables.sections, |section| {
                    section.challenge_id == *challenge_id
                })
            }
            CascadeStep::DeleteChallenge {
                challenge_id,
                owner,
            } => remove_where(&mut tables.challenges, |challenge| {
                challenge.id == *challenge_id && challenge.is_owned_by(owner)
            }),
            CascadeStep::RestartChallenge {
                challenge_id,
                owner,
            } => match tables
                .challenges
                .get_mut(challenge_id)
                .filter(|challenge| challenge.is_owned_by(owner))
            {
                Some(challenge) => {
                    challenge.current_day = 1;
                    challenge.status = ChallengeStatus::Active;
                    challenge.updated_at = Utc::now();
                    1
                }
                None => 0,
            },
            CascadeStep::DeleteSection { section_id } => {
                u64::from(tables.sections.remove(section_id).is_some())
            }
            CascadeStep::DeleteTask { task_id } => u64::from(tables.tasks.remove(task_id).is_some()),
            CascadeStep::CompactSiblings { parent, shift } => {
                tables.shift_siblings(*parent, *shift)?
            }
        };
        Ok(rows)
    }
}

#[async_trait]
impl CascadeStepRunner for MemoryCascadeRunner<'_> {
    type Error = StepFailure;

    async fn run(&mut self, step: &CascadeStep) -> Result<u64, Self::Error> {
        self.check_fault(step.kind())?;
        self.apply(step)
    }
}
