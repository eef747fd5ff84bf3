//! PostgreSQL persistence adapters using Diesel.
//!
//! Each driven repository port has one adapter here, backed by a shared
//! [`DbPool`] of `diesel-async` connections.
//!
//! - Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//!   private to this module.
//! - Multi-step mutations (ordered inserts and moves, cascades, ledger
//!   upserts) run in one transaction and roll back on any failure.
//! - Database detail is logged at `debug` and never returned to callers.
//!
//! # Example
//!
//! ```ignore
//! use hardinfinity::outbound::persistence::{DbPool, DieselChallengeRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/challenges")).await?;
//! let challenges = DieselChallengeRepository::new(pool.clone());
//! ```

mod diesel_basic_error_mapping;
mod diesel_cascade_runner;
mod diesel_challenge_repository;
mod diesel_day_ledger_repository;
mod diesel_measurement_repository;
mod diesel_section_repository;
mod diesel_task_repository;
mod diesel_transaction;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_challenge_repository::DieselChallengeRepository;
pub use diesel_day_ledger_repository::DieselDayLedgerRepository;
pub use diesel_measurement_repository::DieselMeasurementRepository;
pub use diesel_section_repository::DieselSectionRepository;
pub use diesel_task_repository::DieselTaskRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
