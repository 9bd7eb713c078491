//! Ingestion request/response types and the state-transition discipline
//! for the `Ingestion` row (spec.md §4.5), grounded on the teacher's
//! `Job`/`JobStateMachine` — simplified to a pure validator since the
//! row itself is owned and persisted by `buildgraph_storage::MetadataStore`.

use crate::error::{OrchestratorError, Result};
use buildgraph_storage::IngestionState;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Request fields named in spec.md §4.5. Carries its own
/// [`CancellationToken`] (spec.md §5: "every blocking call accepts a
/// cancellation token derived from the request") — not part of the wire
/// representation, so it's skipped on (de)serialization and a fresh,
/// never-cancelled token is substituted on the way back in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionRequest {
    pub tenant_id: String,
    pub repo_full_name: String,
    pub commit_sha: String,
    pub pr_number: Option<i64>,
    pub branch: String,
    pub default_branch: String,
    pub installation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Duration>,
    #[serde(skip, default)]
    pub cancellation: CancellationToken,
}

impl IngestionRequest {
    /// `repo_id + ":" + commit_sha` (+ `":prN"` if a PR number is present).
    pub fn idempotency_key(&self) -> String {
        match self.pr_number {
            Some(pr) => format!("{}:{}:pr{}", self.repo_full_name, self.commit_sha, pr),
            None => format!("{}:{}", self.repo_full_name, self.commit_sha),
        }
    }

    pub fn is_default_branch(&self) -> bool {
        self.branch == self.default_branch
    }
}

/// Boundary response: `{snapshot_id, base_snapshot_id?, delta_id?, score_id?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionResponse {
    pub snapshot_id: Uuid,
    pub base_snapshot_id: Option<Uuid>,
    pub delta_id: Option<Uuid>,
    pub score_id: Option<Uuid>,
}

/// Validates an `Ingestion` row's lifecycle transition: QUEUED → RUNNING →
/// {COMPLETED | FAILED}. Any other pair is rejected. Kept as a free
/// function — unlike the teacher's `JobStateMachine`, the row of record
/// lives in the metadata store, not in an owned struct here.
pub fn validate_transition(from: IngestionState, to: IngestionState) -> Result<()> {
    use IngestionState::*;
    let ok = matches!(
        (from, to),
        (Queued, Running) | (Running, Completed) | (Running, Failed)
    );
    if ok {
        Ok(())
    } else {
        Err(OrchestratorError::InvalidStateTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotency_key_includes_pr_number() {
        let req = IngestionRequest {
            tenant_id: "acme".into(),
            repo_full_name: "acme/widgets".into(),
            commit_sha: "deadbeef".into(),
            pr_number: Some(42),
            branch: "feature".into(),
            default_branch: "main".into(),
            installation_id: None,
            deadline: None,
            cancellation: CancellationToken::new(),
        };
        assert_eq!(req.idempotency_key(), "acme/widgets:deadbeef:pr42");
    }

    #[test]
    fn idempotency_key_without_pr_number() {
        let req = IngestionRequest {
            tenant_id: "acme".into(),
            repo_full_name: "acme/widgets".into(),
            commit_sha: "deadbeef".into(),
            pr_number: None,
            branch: "main".into(),
            default_branch: "main".into(),
            installation_id: None,
            deadline: None,
            cancellation: CancellationToken::new(),
        };
        assert_eq!(req.idempotency_key(), "acme/widgets:deadbeef");
        assert!(req.is_default_branch());
    }

    #[test]
    fn valid_transitions_accepted() {
        use IngestionState::*;
        assert!(validate_transition(Queued, Running).is_ok());
        assert!(validate_transition(Running, Completed).is_ok());
        assert!(validate_transition(Running, Failed).is_ok());
    }

    #[test]
    fn invalid_transitions_rejected() {
        use IngestionState::*;
        assert!(validate_transition(Completed, Running).is_err());
        assert!(validate_transition(Queued, Completed).is_err());
    }
}
