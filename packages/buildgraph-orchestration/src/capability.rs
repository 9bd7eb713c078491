//! Named capabilities the orchestrator depends on but does not implement:
//! `Extractor`, `RefResolver`, `TenantDirectory`. Real implementations
//! (talking to a build system, a VCS host, a tenant config service) plug
//! in at construction; tests substitute the in-memory fakes below,
//! following the teacher's `CheckpointManager::new_in_memory()` pattern.

use crate::error::{OrchestratorError, Result};
use async_trait::async_trait;
use buildgraph_core::Snapshot;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// How much of the dependency graph an extraction call should cover.
/// Semantics of roots/rdeps depth are opaque to the core — they're
/// forwarded to whatever extractor implementation is plugged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeMode {
    Full,
    Scoped {
        roots: Vec<String>,
        rdeps_depth: Option<u32>,
    },
}

/// Request passed to [`Extractor::extract`].
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub commit_sha: String,
    pub scope: ScopeMode,
    pub timeout: Duration,
}

impl ExtractionRequest {
    pub fn full(commit_sha: impl Into<String>, timeout: Duration) -> Self {
        Self {
            commit_sha: commit_sha.into(),
            scope: ScopeMode::Full,
            timeout,
        }
    }
}

/// Produces a [`Snapshot`] for a given commit. The one capability the
/// orchestrator cannot substitute with a pure computation — it talks to
/// whatever build system actually owns the dependency graph.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, request: ExtractionRequest) -> Result<Snapshot>;
}

/// Resolves a branch name to the commit SHA it currently points at.
/// Needed to find the baseline snapshot's commit before the first
/// ingestion for a repository establishes one. `repo` is the VCS-facing
/// identifier (e.g. `"acme/widgets"`) a real ref-resolution backend
/// understands, not the storage-assigned repository id.
#[async_trait]
pub trait RefResolver: Send + Sync {
    async fn resolve(&self, repo: &str, branch: &str) -> Result<String>;
}

/// Resolves a webhook installation identifier to the tenant identifier
/// that owns it. Kept separate from `RefResolver` because the two vary
/// independently — a single tenant can host many repositories, each with
/// its own ref namespace.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn tenant_for_installation(&self, installation_id: &str) -> Result<String>;
}

/// In-memory [`Extractor`] fake: returns pre-seeded snapshots keyed by
/// commit SHA.
#[derive(Default)]
pub struct InMemoryExtractor {
    snapshots: Mutex<HashMap<String, Snapshot>>,
}

impl InMemoryExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, commit_sha: impl Into<String>, snapshot: Snapshot) {
        self.snapshots.lock().insert(commit_sha.into(), snapshot);
    }
}

#[async_trait]
impl Extractor for InMemoryExtractor {
    async fn extract(&self, request: ExtractionRequest) -> Result<Snapshot> {
        self.snapshots
            .lock()
            .get(&request.commit_sha)
            .cloned()
            .ok_or_else(|| OrchestratorError::extractor(format!("no snapshot seeded for {}", request.commit_sha)))
    }
}

/// In-memory [`RefResolver`] fake.
#[derive(Default)]
pub struct InMemoryRefResolver {
    refs: Mutex<HashMap<(String, String), String>>,
}

impl InMemoryRefResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, repo: impl Into<String>, branch: impl Into<String>, commit_sha: impl Into<String>) {
        self.refs
            .lock()
            .insert((repo.into(), branch.into()), commit_sha.into());
    }
}

#[async_trait]
impl RefResolver for InMemoryRefResolver {
    async fn resolve(&self, repo: &str, branch: &str) -> Result<String> {
        self.refs
            .lock()
            .get(&(repo.to_string(), branch.to_string()))
            .cloned()
            .ok_or_else(|| OrchestratorError::not_found(format!("no ref {repo}@{branch}")))
    }
}

/// In-memory [`TenantDirectory`] fake.
#[derive(Default)]
pub struct InMemoryTenantDirectory {
    installations: Mutex<HashMap<String, String>>,
}

impl InMemoryTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, installation_id: impl Into<String>, tenant_id: impl Into<String>) {
        self.installations
            .lock()
            .insert(installation_id.into(), tenant_id.into());
    }
}

#[async_trait]
impl TenantDirectory for InMemoryTenantDirectory {
    async fn tenant_for_installation(&self, installation_id: &str) -> Result<String> {
        self.installations
            .lock()
            .get(installation_id)
            .cloned()
            .ok_or_else(|| OrchestratorError::not_found(format!("no tenant for installation {installation_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildgraph_core::Snapshot;

    #[tokio::test]
    async fn extractor_fake_returns_seeded_snapshot() {
        let extractor = InMemoryExtractor::new();
        extractor.seed("abc123", Snapshot::new("abc123", "main"));
        let snap = extractor
            .extract(ExtractionRequest::full("abc123", Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(snap.commit_sha, "abc123");
    }

    #[tokio::test]
    async fn extractor_fake_reports_missing_commit() {
        let extractor = InMemoryExtractor::new();
        let err = extractor
            .extract(ExtractionRequest::full("missing", Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Extractor(_)));
    }
}
