//! Sync-specific error types
//!
//! Provides error classification for queue replay with retry metadata.

use shiftfence_domain::ShiftFenceError;
use thiserror::Error;

/// Categories of sync errors for retry logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncErrorCategory {
    /// Authentication errors (401, 403) - retryable after re-login
    Authentication,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except auth) - non-retryable
    Client,
    /// Network/connection errors - retryable
    Network,
    /// Database errors - may be retryable
    Database,
    /// Configuration errors - non-retryable
    Config,
}

/// Queue replay errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Operation cancelled")]
    Cancelled,
}

impl SyncError {
    /// Get the error category for this error
    pub fn category(&self) -> SyncErrorCategory {
        match self {
            Self::Auth(_) => SyncErrorCategory::Authentication,
            Self::Server(_) => SyncErrorCategory::Server,
            Self::Client(_) => SyncErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => SyncErrorCategory::Network,
            Self::Database(_) => SyncErrorCategory::Database,
            Self::Config(_) | Self::Cancelled => SyncErrorCategory::Config,
        }
    }

    /// Check if the failed action should stay queued for the next
    /// connectivity event.
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            SyncErrorCategory::Authentication
                | SyncErrorCategory::Server
                | SyncErrorCategory::Network
                | SyncErrorCategory::Database
        )
    }
}

/// Convert from ShiftFenceError to SyncError
impl From<ShiftFenceError> for SyncError {
    fn from(err: ShiftFenceError) -> Self {
        match err {
            ShiftFenceError::Database(message) => Self::Database(message),
            ShiftFenceError::Config(message) => Self::Config(message),
            ShiftFenceError::Network(message) => Self::Network(message),
            ShiftFenceError::Auth(message) => Self::Auth(message),
            ShiftFenceError::Location(message) => Self::Client(message),
            ShiftFenceError::Conflict { message, .. }
            | ShiftFenceError::PerimeterViolation(message) => Self::Client(message),
            ShiftFenceError::NotFound(message) | ShiftFenceError::InvalidInput(message) => {
                Self::Client(message)
            }
            ShiftFenceError::Internal(message) => Self::Server(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_categories() {
        assert_eq!(
            SyncError::Auth("test".to_string()).category(),
            SyncErrorCategory::Authentication
        );
        assert_eq!(SyncError::Server("test".to_string()).category(), SyncErrorCategory::Server);
        assert_eq!(SyncError::Network("test".to_string()).category(), SyncErrorCategory::Network);
        assert_eq!(
            SyncError::Timeout(std::time::Duration::from_secs(5)).category(),
            SyncErrorCategory::Network
        );
    }

    #[test]
    fn retryability_follows_category() {
        assert!(SyncError::Server("test".to_string()).should_retry());
        assert!(SyncError::Network("test".to_string()).should_retry());
        assert!(!SyncError::Client("test".to_string()).should_retry());
        assert!(!SyncError::Config("test".to_string()).should_retry());
    }

    #[test]
    fn conflict_converts_to_client_error() {
        let err = SyncError::from(ShiftFenceError::Conflict {
            message: "You already have an active shift".to_string(),
            existing_shift: None,
        });
        assert!(!err.should_retry());
    }
}
