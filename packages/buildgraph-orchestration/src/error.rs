//! Error types for buildgraph-orchestration.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Error taxonomy matching the error-handling design: the orchestrator is
/// the one place that converts lower-layer errors into a terminal row
/// state, so every variant here has to be classifiable via
/// [`ErrorCategory`].
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("storage error: {0}")]
    Storage(#[from] buildgraph_storage::StorageError),

    #[error("scoring error: {0}")]
    Scoring(#[from] buildgraph_scoring::ScoringError),

    #[error("core error: {0}")]
    Core(#[from] buildgraph_core::CoreError),

    #[error("extractor error: {0}")]
    Extractor(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded: {0}")]
    Timeout(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OrchestratorError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn extractor(msg: impl Into<String>) -> Self {
        Self::Extractor(msg.into())
    }

    /// Classifies this error for the ingestion row's error message and for
    /// deciding whether a caller's retry has any chance of succeeding.
    /// Mirrors spec.md §7's InvalidInput/NotFound/Transient/Permanent split.
    pub fn category(&self) -> ErrorCategory {
        match self {
            OrchestratorError::Storage(e) => {
                if e.is_not_found() {
                    ErrorCategory::Permanent
                } else {
                    match e.kind {
                        buildgraph_storage::ErrorKind::Transient => ErrorCategory::Transient,
                        buildgraph_storage::ErrorKind::Corruption => ErrorCategory::Permanent,
                        buildgraph_storage::ErrorKind::NotFound => ErrorCategory::Permanent,
                        buildgraph_storage::ErrorKind::InvalidInput => ErrorCategory::Permanent,
                        buildgraph_storage::ErrorKind::Conflict => ErrorCategory::Permanent,
                    }
                }
            }
            OrchestratorError::Scoring(_) => ErrorCategory::Permanent,
            OrchestratorError::Core(_) => ErrorCategory::Permanent,
            OrchestratorError::Extractor(_) => ErrorCategory::Transient,
            OrchestratorError::InvalidInput(_) => ErrorCategory::Permanent,
            OrchestratorError::NotFound(_) => ErrorCategory::Permanent,
            OrchestratorError::InvalidStateTransition { .. } => ErrorCategory::Permanent,
            OrchestratorError::Cancelled => ErrorCategory::Transient,
            OrchestratorError::Timeout(_) => ErrorCategory::Transient,
            OrchestratorError::Other(_) => ErrorCategory::Permanent,
        }
    }
}

/// Error category used to decide whether a failed ingestion is worth a
/// client-initiated retry. The webhook layer (external to this crate)
/// owns the actual retry schedule — this only classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transient,
    Permanent,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transient => "transient",
            ErrorCategory::Permanent => "permanent",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_not_found_classifies_permanent() {
        let err = OrchestratorError::Storage(buildgraph_storage::StorageError::not_found("x"));
        assert_eq!(err.category(), ErrorCategory::Permanent);
    }

    #[test]
    fn extractor_errors_classify_transient() {
        let err = OrchestratorError::extractor("timeout contacting extractor");
        assert_eq!(err.category(), ErrorCategory::Transient);
    }
}
