//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Shift;

/// Main error type for ShiftFence
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum ShiftFenceError {
    /// Location acquisition failed: permission denied, hardware error or
    /// timeout. Clock-in stays disabled until resolved.
    #[error("Location unavailable: {0}")]
    Location(String),

    /// The server rejected a clock-in because an open shift already exists.
    /// Carries the open shift so callers can drive the reset-retry protocol.
    #[error("Active shift conflict: {message}")]
    Conflict {
        message: String,
        existing_shift: Option<Shift>,
    },

    /// The server-side perimeter check rejected the clock action.
    #[error("Outside the designated area: {0}")]
    PerimeterViolation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShiftFenceError {
    /// True when the failure is transient connectivity and the action should
    /// be queued for replay instead of being dropped.
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Result type alias for ShiftFence operations
pub type Result<T> = std::result::Result<T, ShiftFenceError>;
