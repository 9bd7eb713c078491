//! Error types for buildgraph-core
//!
//! Pure graph operations in this crate are infallible; this type only
//! covers the (de)serialization boundary.

use thiserror::Error;

/// Main error type for buildgraph-core operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed JSON payload for a Snapshot/Edge/Delta
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A snapshot invariant was violated (e.g. an edge endpoint missing from `nodes`)
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// A pure computation received null/malformed arguments
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for buildgraph-core operations
pub type Result<T> = std::result::Result<T, CoreError>;
