//! Error types for buildgraph-scoring

use thiserror::Error;

/// Main error type for buildgraph-scoring operations
#[derive(Debug, Error)]
pub enum ScoringError {
    /// A scoring config field was out of its valid range
    #[error("invalid scoring config: {0}")]
    InvalidConfig(String),

    /// The caller passed an empty metric set to a `ScoringEngine`
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for buildgraph-scoring operations
pub type Result<T> = std::result::Result<T, ScoringError>;
