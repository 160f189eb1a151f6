//! Error types for the neurocoach_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for neurocoach_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request field missing, malformed or out of range
    #[error("Validation error: {0}")]
    Validation(String),

    /// Exercise id not present in the catalog
    #[error("Unknown exercise: {0}")]
    UnknownExercise(String),

    /// The measurement required by the exercise rule was not supplied
    #[error("Field '{field}' is required for exercise '{exercise}'")]
    MissingMeasurement {
        exercise: String,
        field: &'static str,
    },

    /// The supplied measurement cannot be scored (negative or too large)
    #[error("Invalid measurement for exercise '{exercise}': {reason}")]
    InvalidMeasurement { exercise: String, reason: String },

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Failure inside a deterministic code path
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error was caused by the request rather than the system.
    ///
    /// Client errors map to a 4xx-style rejection; everything else is internal.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::UnknownExercise(_)
                | Error::MissingMeasurement { .. }
                | Error::InvalidMeasurement { .. }
        )
    }
}
