//! Tests for day ledger HTTP handlers.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};
use uuid::Uuid;

use super::*;
use crate::domain::service_test_support::fixture_timestamp;
use crate::domain::{ChallengeStatus, Rating, TaskValue};
use crate::inbound::http::test_utils::{MockPorts, bearer};

fn entry(challenge_id: Uuid, day_number: u32, completed: bool) -> DayEntry {
    let now = fixture_timestamp();
    let record_id = Uuid::new_v4();
    DayEntry {
        record: DayRecord {
            id: record_id,
            challenge_id,
            day_number,
            date: now,
            completed,
            notes: String::new(),
            progress_photo_url: None,
            energy_level: Rating::new(7).ok(),
            mood_level: None,
            created_at: now,
            updated_at: now,
        },
        task_records: vec![TaskRecord {
            id: Uuid::new_v4(),
            day_record_id: record_id,
            task_id: Uuid::new_v4(),
            completed: true,
            value: Some(TaskValue::Number(3.5)),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }],
    }
}

async fn send(ports: MockPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(ports.into_app()).await;
    let res = actix_test::call_service(&app, request.insert_header(bearer()).to_request()).await;
    let status = res.status();
    (status, actix_test::read_body_json(res).await)
}

#[rstest]
#[case(true, StatusCode::CREATED)]
#[case(false, StatusCode::OK)]
#[actix_web::test]
async fn upsert_today_status_reflects_creation(#[case] created: bool, #[case] expected: StatusCode) {
    let challenge_id = Uuid::new_v4();
    let task_id = Uuid::new_v4();
    let mut ports = MockPorts::default();
    ports
        .ledger
        .expect_upsert_day()
        .withf(move |req| {
            req.challenge.challenge_id == challenge_id
                && req.target == DayTarget::Current
                && req.submission.completed
                && req.submission.energy_level == Rating::new(6).ok()
                && req.submission.task_records.len() == 1
                && req.submission.task_records[0].task_id == task_id
                && req.submission.task_records[0].value == Some(json!(true))
        })
        .times(1)
        .returning(move |req| {
            Ok(UpsertDayResponse {
                entry: entry(req.challenge.challenge_id, 4, true),
                created,
                advanced_to: created.then_some(5),
            })
        });

    let (status, body) = send(
        ports,
        actix_test::TestRequest::post()
            .uri(&format!("/api/challenges/{challenge_id}/entries"))
            .set_json(json!({
                "completed": true,
                "energyLevel": 6,
                "taskRecords": [{"taskId": task_id.to_string(), "completed": true, "value": true}],
            })),
    )
    .await;

    assert_eq!(status, expected);
    assert_eq!(body["data"]["created"], created);
    assert_eq!(body["data"]["entry"]["dayNumber"], 4);
    assert_eq!(body["data"]["entry"]["energyLevel"], 7);
    assert_eq!(body["data"]["entry"]["taskRecords"][0]["value"], 3.5);
}

#[rstest]
#[case(json!({"energyLevel": 11}), "energyLevel")]
#[case(json!({"moodLevel": -1}), "moodLevel")]
#[case(json!({"taskRecords": [{"taskId": "nope"}]}), "taskRecords.taskId")]
#[actix_web::test]
async fn invalid_submissions_are_rejected_before_the_ledger(
    #[case] payload: Value,
    #[case] field: &str,
) {
    let (status, body) = send(
        MockPorts::default(),
        actix_test::TestRequest::post()
            .uri(&format!("/api/challenges/{}/entries", Uuid::new_v4()))
            .set_json(payload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn upsert_by_day_targets_explicit_day() {
    let mut ports = MockPorts::default();
    ports
        .ledger
        .expect_upsert_day()
        .withf(|req| req.target == DayTarget::Day(2))
        .returning(|req| {
            Ok(UpsertDayResponse {
                entry: entry(req.challenge.challenge_id, 2, false),
                created: false,
                advanced_to: None,
            })
        });

    let (status, body) = send(
        ports,
        actix_test::TestRequest::put()
            .uri(&format!("/api/challenges/{}/entries/2", Uuid::new_v4()))
            .set_json(json!({"completed": false, "notes": "rest day"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["advancedTo"], Value::Null);
}

#[rstest]
#[actix_web::test]
async fn inactive_challenge_conflict_is_409() {
    let mut ports = MockPorts::default();
    ports.ledger.expect_upsert_day().returning(|_| {
        Err(Error::conflict(format!(
            "challenge is {}; entries can only be recorded while active",
            ChallengeStatus::Completed
        )))
    });

    let (status, body) = send(
        ports,
        actix_test::TestRequest::post()
            .uri(&format!("/api/challenges/{}/entries", Uuid::new_v4()))
            .set_json(json!({"completed": true})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[rstest]
#[case("0")]
#[case("yesterday")]
#[actix_web::test]
async fn get_entry_rejects_bad_day_segment(#[case] day: &str) {
    let (status, body) = send(
        MockPorts::default(),
        actix_test::TestRequest::get()
            .uri(&format!("/api/challenges/{}/entries/{day}", Uuid::new_v4())),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "invalid_day");
}

#[rstest]
#[actix_web::test]
async fn get_entry_returns_nested_task_records() {
    let challenge_id = Uuid::new_v4();
    let mut ports = MockPorts::default();
    ports
        .ledger_query
        .expect_get_day()
        .withf(move |day| day.challenge.challenge_id == challenge_id && day.day_number == 3)
        .returning(|day| Ok(entry(day.challenge.challenge_id, day.day_number, true)));

    let (status, body) = send(
        ports,
        actix_test::TestRequest::get().uri(&format!("/api/challenges/{challenge_id}/entries/3")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["dayNumber"], 3);
    assert_eq!(body["data"]["taskRecords"].as_array().map(Vec::len), Some(1));
}

#[rstest]
#[actix_web::test]
async fn list_entries_returns_records_only() {
    let challenge_id = Uuid::new_v4();
    let mut ports = MockPorts::default();
    ports.ledger_query.expect_list_days().returning(move |_| {
        Ok(vec![
            entry(challenge_id, 1, true).record,
            entry(challenge_id, 2, false).record,
        ])
    });

    let (status, body) = send(
        ports,
        actix_test::TestRequest::get().uri(&format!("/api/challenges/{challenge_id}/entries")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][1]["completed"], false);
    assert!(body["data"][0].get("taskRecords").is_none());
}
