//! Domain primitives, algorithms and services.
//!
//! Purpose: define the challenge tracker's entities and the three pure
//! engines they rely on (ordered sibling sets, streak aggregation, cascade
//! planning), plus the services that implement the driving ports.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Challenge, Section, Task, DayRecord, TaskRecord, Measurement: entities.
//! - plan_move / plan_insert / plan_removal: sibling ordering plans.
//! - summarise_streaks: streak and completion metrics.
//! - run_cascade and the `*_plan` builders: ordered multi-table deletes.

pub mod cascade;
mod challenge;
mod challenge_service;
pub mod error;
mod ledger;
mod ledger_service;
mod measurement;
mod measurement_service;
mod name;
pub mod ordering;
pub mod ports;
mod section;
mod section_service;
#[cfg(test)]
pub(crate) mod service_test_support;
pub mod streak;
mod task;
mod task_service;
pub mod trace_id;
mod user;

pub use self::cascade::{
    CascadeError, CascadeStep, CascadeStepKind, CascadeStepRunner, SiblingParent,
    delete_challenge_plan, delete_section_plan, delete_task_plan, reset_challenge_plan,
    run_cascade,
};
pub use self::challenge::{
    Challenge, ChallengeChanges, ChallengeDraft, ChallengeStatus, ChallengeValidationError,
    ParseChallengeStatusError,
};
pub use self::challenge_service::ChallengeService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ledger::{
    DayEntry, DayRecord, DaySubmission, DayTarget, DayUpsertOutcome, DayUpsertPlan,
    LedgerRejection, RATING_MAX, Rating, RatingError, TaskRecord, TaskRecordSubmission,
    TaskValue, ValidatedTaskRecord, plan_day_upsert, resolve_day,
};
pub use self::ledger_service::LedgerService;
pub use self::measurement::{
    BodyMetrics, Measurement, MeasurementChanges, MeasurementDraft, MetricValidationError,
};
pub use self::measurement_service::MeasurementService;
pub use self::name::{ENTITY_NAME_MAX, EntityName, NameValidationError};
pub use self::ordering::{
    InsertPlan, MovePlan, OrderShift, OrderingError, ShiftDirection, SiblingOrder, is_dense,
    plan_insert, plan_move, plan_removal,
};
pub use self::section::{Section, SectionChanges, SectionDraft};
pub use self::section_service::SectionService;
pub use self::streak::{DEFAULT_PROGRAM_LENGTH, DayCompletion, StreakSummary, summarise_streaks};
pub use self::task::{
    DEFAULT_STRIKES_LIMIT, ParseTaskTypeError, StrikesPolicy, Task, TaskDraft, TaskSettings,
    TaskType,
};
pub use self::task_service::TaskService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{USER_ID_MAX, UserId, UserValidationError};
