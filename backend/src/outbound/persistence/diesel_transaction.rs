//! Error type for transactions that can abort on a domain decision.

use diesel::result::Error as DieselError;

use crate::domain::CascadeError;

/// Failure inside a repository transaction.
///
/// `Domain` carries a port error decided mid-transaction (a missing row, a
/// refused submission); either variant rolls the transaction back.
#[derive(Debug)]
pub(crate) enum TxError<E> {
    Diesel(DieselError),
    Domain(E),
}

impl<E> From<DieselError> for TxError<E> {
    fn from(error: DieselError) -> Self {
        Self::Diesel(error)
    }
}

impl<E> TxError<E> {
    /// Collapse into the port error, mapping Diesel failures with `map`.
    pub(crate) fn into_port(self, map: impl FnOnce(DieselError) -> E) -> E {
        match self {
            Self::Diesel(error) => map(error),
            Self::Domain(error) => error,
        }
    }

    /// Translate a cascade failure; a guarded miss becomes `not_found`.
    pub(crate) fn from_cascade(error: CascadeError<DieselError>, not_found: impl FnOnce() -> E) -> Self {
        match error {
            CascadeError::NotFound { .. } => Self::Domain(not_found()),
            CascadeError::Step(error) => Self::Diesel(error),
        }
    }
}
