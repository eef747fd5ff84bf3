//! Tests for the challenge service.

use chrono::Duration;
use rstest::rstest;

use super::*;
use crate::domain::ports::MockChallengeRepository;
use crate::domain::service_test_support::{fixture_clock, fixture_timestamp, name, sample_challenge};
use crate::domain::{ChallengeStatus, DayCompletion, ErrorCode};

fn service(repo: MockChallengeRepository) -> ChallengeService<MockChallengeRepository> {
    ChallengeService::new(Arc::new(repo), fixture_clock())
}

fn challenge_ref(challenge: &Challenge) -> ChallengeRef {
    ChallengeRef {
        owner: challenge.owner.clone(),
        challenge_id: challenge.id,
    }
}

#[rstest]
#[tokio::test]
async fn create_defaults_start_date_to_now() {
    let owner = UserId::random();
    let mut repo = MockChallengeRepository::new();
    repo.expect_create()
        .withf(|draft| draft.start_date == fixture_timestamp() && draft.end_date.is_none())
        .times(1)
        .returning(|draft| {
            let mut challenge = sample_challenge(&draft.owner, 1);
            challenge.id = draft.id;
            Ok(challenge)
        });

    let created = service(repo)
        .create_challenge(CreateChallengeRequest {
            owner: owner.clone(),
            name: name("75 Hard"),
            description: String::new(),
            start_date: None,
            end_date: None,
        })
        .await
        .expect("create succeeds");

    assert_eq!(created.owner, owner);
    assert_eq!(created.current_day, 1);
}

#[rstest]
#[tokio::test]
async fn create_rejects_inverted_dates_without_touching_storage() {
    let mut repo = MockChallengeRepository::new();
    repo.expect_create().times(0);

    let error = service(repo)
        .create_challenge(CreateChallengeRequest {
            owner: UserId::random(),
            name: name("75 Hard"),
            description: String::new(),
            start_date: Some(fixture_timestamp()),
            end_date: Some(fixture_timestamp() - Duration::days(1)),
        })
        .await
        .expect_err("invalid dates");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn update_rejects_day_zero() {
    let mut repo = MockChallengeRepository::new();
    repo.expect_update().times(0);

    let error = service(repo)
        .update_challenge(UpdateChallengeRequest {
            owner: UserId::random(),
            challenge_id: Uuid::new_v4(),
            name: name("75 Hard"),
            description: String::new(),
            start_date: fixture_timestamp(),
            end_date: None,
            current_day: 0,
            status: ChallengeStatus::Active,
        })
        .await
        .expect_err("day zero rejected");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn get_hides_foreign_challenges() {
    let mut repo = MockChallengeRepository::new();
    repo.expect_find_for_owner().return_once(|_, _| Ok(None));

    let error = service(repo)
        .get_challenge(ChallengeRef {
            owner: UserId::random(),
            challenge_id: Uuid::new_v4(),
        })
        .await
        .expect_err("not visible");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(
    ChallengeRepositoryError::connection("pool exhausted"),
    ErrorCode::ServiceUnavailable
)]
#[case(ChallengeRepositoryError::query("syntax"), ErrorCode::InternalError)]
#[case(ChallengeRepositoryError::not_found(Uuid::nil()), ErrorCode::NotFound)]
#[tokio::test]
async fn delete_maps_repository_errors(
    #[case] failure: ChallengeRepositoryError,
    #[case] expected: ErrorCode,
) {
    let mut repo = MockChallengeRepository::new();
    repo.expect_delete_cascade()
        .return_once(move |_, _| Err(failure));

    let error = service(repo)
        .delete_challenge(ChallengeRef {
            owner: UserId::random(),
            challenge_id: Uuid::new_v4(),
        })
        .await
        .expect_err("delete fails");

    assert_eq!(error.code(), expected);
}

#[rstest]
#[tokio::test]
async fn reset_returns_restarted_challenge() {
    let owner = UserId::random();
    let challenge = sample_challenge(&owner, 1);
    let target = challenge_ref(&challenge);
    let returned = challenge.clone();
    let mut repo = MockChallengeRepository::new();
    repo.expect_reset()
        .withf(move |_, id| *id == returned.id)
        .return_once(move |_, _| Ok(challenge));

    let reset = service(repo)
        .reset_challenge(target)
        .await
        .expect("reset succeeds");

    assert_eq!(reset.current_day, 1);
    assert_eq!(reset.status, ChallengeStatus::Active);
}

#[rstest]
#[tokio::test]
async fn progress_aggregates_day_completions() {
    let owner = UserId::random();
    let challenge = sample_challenge(&owner, 5);
    let target = challenge_ref(&challenge);
    let mut repo = MockChallengeRepository::new();
    repo.expect_find_for_owner()
        .return_once(move |_, _| Ok(Some(challenge)));
    repo.expect_day_completions().return_once(|_| {
        Ok(vec![
            DayCompletion::new(1, true),
            DayCompletion::new(2, true),
            DayCompletion::new(3, false),
            DayCompletion::new(4, true),
        ])
    });

    let progress = service(repo)
        .with_program_length(75)
        .challenge_progress(target)
        .await
        .expect("progress succeeds");

    assert_eq!(progress.current_day, 5);
    assert_eq!(progress.streaks.current_streak, 1);
    assert_eq!(progress.streaks.longest_streak, 2);
    assert_eq!(progress.streaks.completed_days, 3);
    assert_eq!(progress.streaks.total_days, 75);
}

#[rstest]
#[tokio::test]
async fn progress_skips_ledger_for_foreign_challenges() {
    let mut repo = MockChallengeRepository::new();
    repo.expect_find_for_owner().return_once(|_, _| Ok(None));
    repo.expect_day_completions().times(0);

    let error = service(repo)
        .challenge_progress(ChallengeRef {
            owner: UserId::random(),
            challenge_id: Uuid::new_v4(),
        })
        .await
        .expect_err("not visible");

    assert_eq!(error.code(), ErrorCode::NotFound);
}
