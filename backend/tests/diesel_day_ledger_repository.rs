//! `DieselDayLedgerRepository` upserts against embedded PostgreSQL.

#[allow(dead_code, reason = "Each Diesel suite uses a subset of the harness.")]
#[path = "support/embedded_postgres.rs"]
mod embedded_postgres;

use chrono::Utc;
use embedded_postgres::PgContext;
use hardinfinity::domain::ports::{
    ChallengeRepository, DayLedgerRepository, DayLedgerRepositoryError,
};
use hardinfinity::domain::{
    DaySubmission, DayTarget, LedgerRejection, TaskRecordSubmission,
};
use rstest::{fixture, rstest};
use serde_json::json;
use uuid::Uuid;

#[fixture]
fn context() -> Option<PgContext> {
    PgContext::try_start()
}

/// A challenge with one task.
fn seed(context: &PgContext) -> (Uuid, Uuid) {
    let challenge_id = context.seed_challenge();
    let section_id = context.seed_section(challenge_id, "Body", None);
    let task_id = context.seed_task(section_id, "Workout", None);
    (challenge_id, task_id)
}

fn current_day(context: &PgContext, challenge_id: Uuid) -> u32 {
    context
        .block_on(
            context
                .challenges()
                .find_for_owner(&context.owner, challenge_id),
        )
        .expect("lookup succeeds")
        .expect("challenge exists")
        .current_day
}

#[rstest]
fn resubmitting_the_same_day_updates_in_place(context: Option<PgContext>) {
    let Some(context) = context else {
        eprintln!("SKIP-TEST-CLUSTER: resubmitting_the_same_day_updates_in_place skipped");
        return;
    };
    let (challenge_id, task_id) = seed(&context);

    let first = context.complete_day(challenge_id, DayTarget::Day(1), &[task_id]);
    let second = context.complete_day(challenge_id, DayTarget::Day(1), &[task_id]);

    assert!(first.created);
    assert_eq!(first.advanced_to, Some(2));
    assert!(!second.created);
    assert_eq!(second.advanced_to, None);
    assert_eq!(second.entry.record.id, first.entry.record.id);
    assert_eq!(second.entry.task_records.len(), 1);
    assert_eq!(context.count("day_records"), 1);
    assert_eq!(context.count("task_records"), 1);
    assert_eq!(current_day(&context, challenge_id), 2);
}

#[rstest]
fn completing_the_current_day_twice_records_consecutive_days(context: Option<PgContext>) {
    let Some(context) = context else {
        eprintln!(
            "SKIP-TEST-CLUSTER: completing_the_current_day_twice_records_consecutive_days skipped"
        );
        return;
    };
    let (challenge_id, task_id) = seed(&context);

    let first = context.complete_day(challenge_id, DayTarget::Current, &[task_id]);
    let second = context.complete_day(challenge_id, DayTarget::Current, &[task_id]);

    assert_eq!(
        (first.entry.record.day_number, first.advanced_to),
        (1, Some(2))
    );
    assert_eq!(
        (second.entry.record.day_number, second.advanced_to),
        (2, Some(3))
    );
    assert!(first.created && second.created);
    assert_eq!(context.count("day_records"), 2);
    assert_eq!(context.count("task_records"), 2);
    assert_eq!(current_day(&context, challenge_id), 3);
}

#[rstest]
fn foreign_tasks_are_rejected_without_writing(context: Option<PgContext>) {
    let Some(context) = context else {
        eprintln!("SKIP-TEST-CLUSTER: foreign_tasks_are_rejected_without_writing skipped");
        return;
    };
    let (challenge_id, _) = seed(&context);
    let (_, foreign_task) = seed(&context);
    let submission = DaySubmission {
        completed: true,
        task_records: vec![TaskRecordSubmission {
            task_id: foreign_task,
            completed: true,
            value: Some(json!(true)),
            notes: String::new(),
        }],
        ..DaySubmission::default()
    };

    let result = context.block_on(context.ledger().upsert(
        &context.owner,
        challenge_id,
        DayTarget::Current,
        &submission,
        Utc::now(),
    ));

    assert_eq!(
        result,
        Err(DayLedgerRepositoryError::rejected(LedgerRejection::UnknownTask {
            task_id: foreign_task,
        }))
    );
    assert_eq!(context.count("day_records"), 0);
    assert_eq!(current_day(&context, challenge_id), 1);
}

#[rstest]
fn days_beyond_the_current_one_are_out_of_range(context: Option<PgContext>) {
    let Some(context) = context else {
        eprintln!("SKIP-TEST-CLUSTER: days_beyond_the_current_one_are_out_of_range skipped");
        return;
    };
    let (challenge_id, task_id) = seed(&context);
    context.complete_day(challenge_id, DayTarget::Current, &[task_id]);

    let result = context.block_on(context.ledger().upsert(
        &context.owner,
        challenge_id,
        DayTarget::Day(5),
        &DaySubmission::default(),
        Utc::now(),
    ));

    assert_eq!(
        result,
        Err(DayLedgerRepositoryError::rejected(
            LedgerRejection::DayOutOfRange {
                day: 5,
                current_day: 2,
            }
        ))
    );
    assert_eq!(context.count("day_records"), 1);
}
