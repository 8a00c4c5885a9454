//! Conversions from the infrastructure errors Cadence produces into
//! [`CadenceError`].
//!
//! Covered sources: SQLite statements, the r2d2 pool, blocking database
//! tasks and the provider HTTP transport.

use cadence_domain::CadenceError;
use rusqlite::ffi::ErrorCode;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CadenceError);

impl From<InfraError> for CadenceError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CadenceError> for InfraError {
    fn from(value: CadenceError) -> Self {
        InfraError(value)
    }
}

impl From<rusqlite::Error> for InfraError {
    fn from(value: rusqlite::Error) -> Self {
        use rusqlite::Error as RE;

        let mapped = match value {
            RE::SqliteFailure(err, message) => match err.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    CadenceError::Persistence("database is busy; try the pass again".into())
                }
                ErrorCode::ConstraintViolation => CadenceError::Persistence(format!(
                    "constraint violation: {}",
                    message.unwrap_or_else(|| "unknown constraint".into())
                )),
                code => CadenceError::Persistence(format!(
                    "sqlite failure {code:?} (code {}): {}",
                    err.extended_code,
                    message.unwrap_or_default()
                )),
            },
            RE::QueryReturnedNoRows => CadenceError::NotFound("no matching row".into()),
            RE::IntegralValueOutOfRange(column, value) => CadenceError::Persistence(format!(
                "stored timestamp {value} in column {column} is out of range"
            )),
            RE::FromSqlConversionFailure(_, _, cause) => {
                CadenceError::Persistence(format!("unreadable stored value: {cause}"))
            }
            other => CadenceError::Persistence(other.to_string()),
        };
        InfraError(mapped)
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(CadenceError::Persistence(format!("connection pool error: {value}")))
    }
}

impl From<JoinError> for InfraError {
    fn from(value: JoinError) -> Self {
        InfraError(CadenceError::Internal(format!("database task failed: {value}")))
    }
}

/// Transport-level failures only; HTTP statuses are mapped by the adapters.
impl From<reqwest::Error> for InfraError {
    fn from(value: reqwest::Error) -> Self {
        let mapped = if value.is_timeout() {
            CadenceError::Network("request to provider timed out".into())
        } else if value.is_connect() {
            CadenceError::Network(format!("could not reach provider: {value}"))
        } else if value.is_decode() {
            CadenceError::Internal(format!("unreadable provider response: {value}"))
        } else if value.is_builder() {
            CadenceError::Internal(format!("invalid provider request: {value}"))
        } else {
            CadenceError::Network(value.to_string())
        };
        InfraError(mapped)
    }
}
