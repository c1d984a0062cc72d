//! Error types for the Vigil library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Vigil operations.
#[derive(Debug, Error)]
pub enum VigilError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Empty file or no data to process.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required columns are absent from a table handed to the normalizer.
    #[error("Missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// `transform` was called before `fit_transform`.
    #[error("Normalizer is not fitted: call fit_transform() before transform()")]
    NotFitted,

    /// `fit_transform` was called on a normalizer that already holds fitted state.
    #[error("Normalizer is already fitted; fitted statistics are frozen")]
    AlreadyFitted,

    /// The rule battery found blocking problems.
    #[error("Validation failed: {problems} problems detected\n\nProblem Summary:\n{summary}")]
    ValidationFailed { problems: usize, summary: String },

    /// A feature needed by the model hand-off is absent or not numeric.
    #[error("Missing feature '{column}': {message}")]
    MissingFeature { column: String, message: String },

    /// The label column cannot be used for training.
    #[error("Invalid label column '{column}': {message}")]
    InvalidLabel { column: String, message: String },

    /// A partition split could not be produced.
    #[error("Split error: {0}")]
    Split(String),

    /// Saving or loading persisted artifacts failed.
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// The feature row source failed.
    #[error("Store error: {0}")]
    Store(String),
}

/// Result type alias for Vigil operations.
pub type Result<T> = std::result::Result<T, VigilError>;
