//! Steps shared by the HTTP behaviour suites.

use actix_web::http::Method;
use rstest_bdd_macros::then;
use serde_json::{Value, json};

use crate::http_world::{HttpWorld, data};

/// Create a challenge named `label` and remember its id.
pub fn create_challenge(world: &HttpWorld, label: &str) -> String {
    world.create(label, "/api/challenges", json!({ "name": label }))
}

/// Create a required boolean task in a fresh section of `challenge_id`.
pub fn create_required_task(world: &HttpWorld, challenge_id: &str, label: &str) -> String {
    let section_id = world.create(
        &format!("{label} section"),
        &format!("/api/challenges/{challenge_id}/sections"),
        json!({ "name": "Daily" }),
    );
    world.create(
        label,
        &format!("/api/sections/{section_id}/tasks"),
        json!({ "name": label, "required": true }),
    )
}

/// Submission completing every listed task.
pub fn completed_day(task_ids: &[String]) -> Value {
    let records: Vec<Value> = task_ids
        .iter()
        .map(|task_id| json!({ "taskId": task_id, "completed": true, "value": true }))
        .collect();
    json!({ "completed": true, "taskRecords": records })
}

pub fn current_day(world: &HttpWorld, challenge_id: &str) -> u64 {
    let captured = world.send(Method::GET, &format!("/api/challenges/{challenge_id}"), None);
    assert_eq!(captured.status, 200, "{}", captured.body);
    data(&captured.body)
        .get("currentDay")
        .and_then(Value::as_u64)
        .expect("current day")
}

#[then("the response status is {status}")]
fn the_response_status_is(world: &HttpWorld, status: u16) {
    let last = world.last();
    assert_eq!(last.status, status, "unexpected body {}", last.body);
}

#[then("the challenge is on day {day}")]
fn the_challenge_is_on_day(world: &HttpWorld, day: u64) {
    assert_eq!(current_day(world, &world.id("challenge")), day);
}
