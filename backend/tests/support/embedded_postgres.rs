//! Embedded PostgreSQL harness for the Diesel repository suites.
//!
//! One cluster is shared per test binary. Every test gets its own database,
//! cloned from a template that already carries the migrations; the template
//! name includes a hash of `backend/migrations` so schema edits build a fresh
//! one.
//!
//! Set `SKIP_TEST_CLUSTER=1` where PostgreSQL cannot start. Tests then print
//! a skip marker instead of failing.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use chrono::Utc;
use hardinfinity::domain::ports::{
    ChallengeRepository, DayLedgerRepository, SectionRepository, TaskRepository,
};
use hardinfinity::domain::{
    ChallengeDraft, DaySubmission, DayTarget, DayUpsertOutcome, EntityName, SectionDraft,
    SiblingOrder, StrikesPolicy, TaskDraft, TaskRecordSubmission, TaskSettings, TaskType, UserId,
};
use hardinfinity::outbound::persistence::{
    DbPool, DieselChallengeRepository, DieselDayLedgerRepository, DieselMeasurementRepository,
    DieselSectionRepository, DieselTaskRepository, PoolConfig, run_pending_migrations,
};
use pg_embedded_setup_unpriv::test_support::hash_directory;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use postgres::{Client, NoTls};
use serde_json::json;
use tokio::runtime::Runtime;
use uuid::Uuid;

const CLUSTER_RETRIES: usize = 5;
const RETRY_DELAY: Duration = Duration::from_millis(500);
const TEMPLATE_PREFIX: &str = "hardinfinity_template";

static CLUSTER_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Whether `SKIP_TEST_CLUSTER` asks for cluster-backed tests to be skipped.
fn skip_requested() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Render a `postgres` error with its SQLSTATE and detail.
fn describe(error: &postgres::Error) -> String {
    match error.as_db_error() {
        Some(db) => match db.detail() {
            Some(detail) => format!("{:?}: {}; {detail}", db.code(), db.message()),
            None => format!("{:?}: {}", db.code(), db.message()),
        },
        None => error.to_string(),
    }
}

fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    let _guard = CLUSTER_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());
    if std::env::var_os("PG_PASSWORD").is_none() {
        // SAFETY: serialised by CLUSTER_LOCK and set before the cluster
        // spawns any thread. A fixed password lets later binaries reuse the
        // data directory initialised by the first one.
        unsafe { std::env::set_var("PG_PASSWORD", "hardinfinity_embedded_test") };
    }

    let mut last_error = String::new();
    for attempt in 1..=CLUSTER_RETRIES {
        match pg_embedded_setup_unpriv::test_support::shared_cluster_handle() {
            Ok(handle) => return Ok(handle),
            Err(err) => last_error = format!("attempt {attempt}/{CLUSTER_RETRIES}: {err:?}"),
        }
        std::thread::sleep(RETRY_DELAY);
    }
    Err(last_error)
}

fn template_name() -> Result<String, String> {
    let migrations = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let hash = hash_directory(migrations).map_err(|err| format!("hash migrations: {err}"))?;
    Ok(format!("{TEMPLATE_PREFIX}_{}", hash.get(..8).unwrap_or(&hash)))
}

fn ensure_template(cluster: &ClusterHandle, runtime: &Runtime) -> Result<String, String> {
    let name = template_name()?;
    let _guard = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());
    let exists = cluster
        .database_exists(name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        let url = cluster.connection().database_url(&name);
        runtime
            .block_on(run_pending_migrations(&url))
            .map_err(|err| err.to_string())?;
    }
    Ok(name)
}

/// Pool, runtime and a private database for one test.
pub struct PgContext {
    pool: DbPool,
    runtime: Runtime,
    database_url: String,
    /// Caller owning every seeded row.
    pub owner: UserId,
    _database: TemporaryDatabase,
}

impl PgContext {
    fn start() -> Result<Self, String> {
        let runtime = Runtime::new().map_err(|err| err.to_string())?;
        let cluster = shared_cluster()?;
        let template = ensure_template(cluster, &runtime)?;
        let database = cluster
            .temporary_database_from_template(
                format!("test_{}", Uuid::new_v4().simple()).as_str(),
                template.as_str(),
            )
            .map_err(|err| format!("clone template: {err:?}"))?;
        let database_url = database.url().to_owned();
        let config = PoolConfig::new(database_url.as_str())
            .with_max_size(2)
            .with_min_idle(Some(1));
        let pool = runtime
            .block_on(DbPool::new(config))
            .map_err(|err| err.to_string())?;
        Ok(Self {
            pool,
            runtime,
            database_url,
            owner: UserId::random(),
            _database: database,
        })
    }

    /// Start a context, or `None` when `SKIP_TEST_CLUSTER` is set and the
    /// cluster is unavailable.
    pub fn try_start() -> Option<Self> {
        match Self::start() {
            Ok(context) => Some(context),
            Err(reason) if skip_requested() => {
                eprintln!("SKIP-TEST-CLUSTER: {reason}");
                None
            }
            Err(reason) => {
                panic!("embedded PostgreSQL unavailable: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.")
            }
        }
    }

    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    pub fn challenges(&self) -> DieselChallengeRepository {
        DieselChallengeRepository::new(self.pool.clone())
    }

    pub fn sections(&self) -> DieselSectionRepository {
        DieselSectionRepository::new(self.pool.clone())
    }

    pub fn tasks(&self) -> DieselTaskRepository {
        DieselTaskRepository::new(self.pool.clone())
    }

    pub fn ledger(&self) -> DieselDayLedgerRepository {
        DieselDayLedgerRepository::new(self.pool.clone())
    }

    pub fn measurements(&self) -> DieselMeasurementRepository {
        DieselMeasurementRepository::new(self.pool.clone())
    }

    fn client(&self) -> Client {
        Client::connect(&self.database_url, NoTls)
            .unwrap_or_else(|err| panic!("connect: {}", describe(&err)))
    }

    /// Run raw SQL outside the adapters.
    pub fn execute(&self, sql: &str) {
        self.client()
            .batch_execute(sql)
            .unwrap_or_else(|err| panic!("execute: {}", describe(&err)));
    }

    /// Rows currently stored in `table`.
    pub fn count(&self, table: &str) -> i64 {
        self.client()
            .query_one(format!("SELECT count(*) FROM {table}").as_str(), &[])
            .unwrap_or_else(|err| panic!("count {table}: {}", describe(&err)))
            .get(0)
    }

    /// Row counts of the six tables, in schema order.
    pub fn counts(&self) -> [i64; 6] {
        [
            "challenges",
            "sections",
            "tasks",
            "day_records",
            "task_records",
            "measurements",
        ]
        .map(|table| self.count(table))
    }

    pub fn seed_challenge(&self) -> Uuid {
        let draft = ChallengeDraft::new(
            Uuid::new_v4(),
            self.owner.clone(),
            name("75 Hard"),
            "",
            Utc::now(),
            None,
        )
        .expect("valid draft");
        self.block_on(self.challenges().create(&draft))
            .expect("challenge created")
            .id
    }

    pub fn seed_section(&self, challenge_id: Uuid, label: &str, position: Option<i64>) -> Uuid {
        let draft = SectionDraft {
            id: Uuid::new_v4(),
            challenge_id,
            name: name(label),
            description: String::new(),
            position: position.map(order),
        };
        self.block_on(self.sections().create(&self.owner, &draft))
            .expect("section created")
            .id
    }

    pub fn seed_task(&self, section_id: Uuid, label: &str, position: Option<i64>) -> Uuid {
        let draft = TaskDraft {
            id: Uuid::new_v4(),
            section_id,
            settings: TaskSettings {
                name: name(label),
                description: String::new(),
                task_type: TaskType::Boolean,
                required: true,
                restart_on_fail: false,
                strikes: StrikesPolicy::disabled(),
            },
            position: position.map(order),
        };
        self.block_on(self.tasks().create(&self.owner, &draft))
            .expect("task created")
            .id
    }

    /// Submit a completed day ticking every task in `tasks`.
    pub fn complete_day(
        &self,
        challenge_id: Uuid,
        target: DayTarget,
        tasks: &[Uuid],
    ) -> DayUpsertOutcome {
        let submission = DaySubmission {
            completed: true,
            task_records: tasks
                .iter()
                .map(|&task_id| TaskRecordSubmission {
                    task_id,
                    completed: true,
                    value: Some(json!(true)),
                    notes: String::new(),
                })
                .collect(),
            ..DaySubmission::default()
        };
        self.block_on(
            self.ledger()
                .upsert(&self.owner, challenge_id, target, &submission, Utc::now()),
        )
        .expect("day recorded")
    }

    /// `(name, order)` of the sections of `challenge_id`.
    pub fn section_layout(&self, challenge_id: Uuid) -> Vec<(String, u32)> {
        self.block_on(self.sections().list(&self.owner, challenge_id))
            .expect("sections listed")
            .into_iter()
            .map(|section| (section.name.into(), section.order.get()))
            .collect()
    }

    /// `(name, order)` of the tasks of `section_id`.
    pub fn task_layout(&self, section_id: Uuid) -> Vec<(String, u32)> {
        self.block_on(self.tasks().list(&self.owner, section_id))
            .expect("tasks listed")
            .into_iter()
            .map(|task| (task.name.into(), task.order.get()))
            .collect()
    }
}

pub fn name(raw: &str) -> EntityName {
    EntityName::new(raw).expect("valid name")
}

pub fn order(raw: i64) -> SiblingOrder {
    SiblingOrder::new(raw).expect("valid order")
}

/// Expected `(name, order)` layout for `names` listed in order.
pub fn layout(names: &[&str]) -> Vec<(String, u32)> {
    names.iter().map(|name| (*name).to_owned()).zip(1..).collect()
}
