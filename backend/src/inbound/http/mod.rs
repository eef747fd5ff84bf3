//! HTTP inbound adapter exposing REST endpoints.
//!
//! Every route under `/api` requires a bearer credential and answers with the
//! JSON envelope from [`envelope`] on success or [`error::ErrorEnvelope`] on
//! failure.

use actix_web::web;

pub mod challenges;
pub mod entries;
pub mod envelope;
pub mod error;
pub mod health;
pub mod identity;
pub mod measurements;
pub mod schemas;
pub mod sections;
pub mod state;
pub mod tasks;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

/// Register extractor configuration so malformed input yields error
/// envelopes instead of Actix's plain-text responses.
pub fn configure_extractors(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler));
}

/// Register every `/api` handler on `cfg`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(challenges::list_challenges)
        .service(challenges::create_challenge)
        .service(challenges::get_challenge)
        .service(challenges::update_challenge)
        .service(challenges::delete_challenge)
        .service(challenges::reset_challenge)
        .service(challenges::challenge_progress)
        .service(sections::list_sections)
        .service(sections::create_section)
        .service(sections::update_section)
        .service(sections::move_section)
        .service(sections::delete_section)
        .service(tasks::list_tasks)
        .service(tasks::create_task)
        .service(tasks::update_task)
        .service(tasks::move_task)
        .service(tasks::delete_task)
        .service(entries::list_entries)
        .service(entries::upsert_today)
        .service(entries::get_entry)
        .service(entries::upsert_entry)
        .service(measurements::list_measurements)
        .service(measurements::add_measurement)
        .service(measurements::update_measurement)
        .service(measurements::delete_measurement);
}
