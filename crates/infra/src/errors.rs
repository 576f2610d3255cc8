//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use shiftfence_domain::ShiftFenceError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ShiftFenceError);

impl From<InfraError> for ShiftFenceError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ShiftFenceError> for InfraError {
    fn from(value: ShiftFenceError) -> Self {
        InfraError(value)
    }
}

impl From<SqlError> for InfraError {
    fn from(err: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;

        let domain = match &err {
            SqlError::SqliteFailure(failure, message) => match failure.code {
                ErrorCode::DatabaseBusy => ShiftFenceError::Database("database is busy".into()),
                ErrorCode::DatabaseLocked => {
                    ShiftFenceError::Database("database is locked".into())
                }
                ErrorCode::ConstraintViolation => ShiftFenceError::Database(format!(
                    "constraint violation: {}",
                    message.as_deref().unwrap_or_default()
                )),
                _ => ShiftFenceError::Database(err.to_string()),
            },
            SqlError::QueryReturnedNoRows => {
                ShiftFenceError::NotFound("no rows returned by query".into())
            }
            _ => ShiftFenceError::Database(err.to_string()),
        };
        InfraError(domain)
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(err: r2d2::Error) -> Self {
        InfraError(ShiftFenceError::Database(format!("connection pool error: {err}")))
    }
}

impl From<HttpError> for InfraError {
    fn from(err: HttpError) -> Self {
        let domain = if err.is_timeout() {
            ShiftFenceError::Network("request timed out".into())
        } else if err.is_connect() {
            ShiftFenceError::Network(format!("connection failed: {err}"))
        } else if err.is_decode() {
            ShiftFenceError::Internal(format!("failed to decode response: {err}"))
        } else {
            ShiftFenceError::Network(err.to_string())
        };
        InfraError(domain)
    }
}

impl From<tokio::task::JoinError> for InfraError {
    fn from(err: tokio::task::JoinError) -> Self {
        InfraError(ShiftFenceError::Internal(format!("blocking task failed: {err}")))
    }
}
