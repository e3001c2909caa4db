//! Core error types for pomotick-core.
//!
//! The timer itself never fails: illegal commands are silent no-ops and a
//! broken config file falls back to defaults. Errors only surface at the
//! edges, when reading or writing the persisted record and when validating
//! user input before it reaches the store.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomotick-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The timer driver task is gone
    #[error("Timer driver has shut down")]
    DriverClosed,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the persisted record
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to write the persisted record
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// The data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors raised at the input boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Key does not name a configuration field
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Input is not an integer
    #[error("Invalid value for '{field}': '{input}' is not a whole number")]
    NotANumber { field: String, input: String },

    /// Input is an integer outside the accepted range
    #[error("Invalid value for '{field}': {value} is outside {min}..={max}")]
    OutOfRange {
        field: String,
        value: i64,
        min: u32,
        max: u32,
    },

    /// A duration or cadence of zero reached the store
    #[error("Invalid value for '{field}': must be a positive whole number")]
    NotPositive { field: String },

    /// Unrecognised session type name
    #[error("Unknown session type: {0}")]
    UnknownSessionType(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
