//! Error types for the treadmill_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for treadmill_core operations
///
/// Commands issued in a state where they are not defined (resume while
/// running, skip while paused, ...) are not errors: the engine ignores them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested workout is unknown or has no segments
    #[error("Workout not found: {0}")]
    WorkoutNotFound(String),

    /// The finished session could not be handed to the history sink
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
