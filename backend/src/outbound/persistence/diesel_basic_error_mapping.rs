//! Shared mapping from pool and Diesel failures to port errors.
//!
//! Every repository error implements [`RepositoryFailure`], so one pair of
//! generic helpers serves all adapters.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::RepositoryFailure;

use super::pool::PoolError;

/// Pool failures are always connection failures.
pub(crate) fn map_basic_pool_error<E: RepositoryFailure>(error: PoolError) -> E {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    E::connection_failed(message)
}

/// Classify a Diesel failure as a connection or query failure.
///
/// Database detail is logged at `debug` and never copied into the message.
pub(crate) fn map_basic_diesel_error<E: RepositoryFailure>(error: DieselError) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => E::query_failed("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            E::connection_failed("database connection error")
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            E::query_failed("conflicting record")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            E::query_failed("dangling reference")
        }
        DieselError::QueryBuilderError(_) => E::query_failed("database query error"),
        _ => E::query_failed("database error"),
    }
}
