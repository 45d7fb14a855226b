//! Error types for huddle.

use thiserror::Error;

/// Result type alias for huddle operations.
pub type Result<T> = std::result::Result<T, HuddleError>;

/// Errors that can occur while grouping records.
#[derive(Error, Debug)]
pub enum HuddleError {
    /// I/O error from the record reader or result writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A pipeline task failed or a channel was torn down early.
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
