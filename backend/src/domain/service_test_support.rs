//! Shared fixtures for domain service and HTTP handler tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::{
    Challenge, ChallengeStatus, EntityName, Section, SiblingOrder, StrikesPolicy, Task, TaskType,
    UserId,
};

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

pub(crate) fn name(raw: &str) -> EntityName {
    EntityName::new(raw).expect("valid fixture name")
}

pub(crate) fn order(raw: i64) -> SiblingOrder {
    SiblingOrder::new(raw).expect("valid fixture order")
}

pub(crate) fn sample_challenge(owner: &UserId, current_day: u32) -> Challenge {
    let now = fixture_timestamp();
    Challenge {
        id: Uuid::new_v4(),
        owner: owner.clone(),
        name: name("75 Hard"),
        description: String::new(),
        start_date: now,
        end_date: None,
        current_day,
        status: ChallengeStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn sample_section(challenge_id: Uuid, position: i64) -> Section {
    let now = fixture_timestamp();
    Section {
        id: Uuid::new_v4(),
        challenge_id,
        name: name("Fitness"),
        description: String::new(),
        order: order(position),
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn sample_task(section_id: Uuid, position: i64) -> Task {
    let now = fixture_timestamp();
    Task {
        id: Uuid::new_v4(),
        section_id,
        name: name("Drink a gallon of water"),
        description: String::new(),
        task_type: TaskType::Number,
        required: true,
        restart_on_fail: true,
        strikes: StrikesPolicy::disabled(),
        order: order(position),
        created_at: now,
        updated_at: now,
    }
}
