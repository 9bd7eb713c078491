//! Capability contracts for blob and metadata persistence (spec.md §6).
//!
//! # Capability Abstraction
//!
//! `BlobStore` and `MetadataStore` are named capabilities, not concrete
//! types — callers depend on the trait, real implementations plug in at
//! construction (see [`crate::infrastructure::sqlite`]), and tests
//! substitute [`InMemoryBlobStore`] / [`InMemoryMetadataStore`].
//!
//! # Examples
//!
//! ```rust
//! use buildgraph_storage::domain::{BlobKind, BlobStore, InMemoryBlobStore};
//!
//! # #[tokio::main] async fn main() {
//! let store = InMemoryBlobStore::new();
//! store.put("acme", BlobKind::Snapshots, "abc123", b"{}".to_vec()).await.unwrap();
//! let bytes = store.get("acme", BlobKind::Snapshots, "abc123").await.unwrap();
//! assert_eq!(bytes, b"{}");
//! # }
//! ```

use crate::error::{Result, StorageError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════════
// Blob store
// ═══════════════════════════════════════════════════════════════════════

/// The two blob kinds named by the persisted-state layout in spec.md §6:
/// `{tenant}/snapshots/{id}.json` and `{tenant}/deltas/{id}.json`. Scores
/// are not blobbed — their JSON payload lives directly on the score row
/// (see DESIGN.md for why).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKind {
    Snapshots,
    Deltas,
}

impl BlobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobKind::Snapshots => "snapshots",
            BlobKind::Deltas => "deltas",
        }
    }
}

impl std::fmt::Display for BlobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Layout helper: `{tenant}/{kind}/{id}.json`.
pub fn blob_key(tenant: &str, kind: BlobKind, id: &str) -> String {
    format!("{tenant}/{kind}/{id}.json")
}

/// `put`/`get` over content-addressed JSON blobs, keyed by tenant + kind + id.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, tenant: &str, kind: BlobKind, id: &str, bytes: Vec<u8>) -> Result<()>;

    /// Returns `StorageError::not_found` if the key is absent.
    async fn get(&self, tenant: &str, kind: BlobKind, id: &str) -> Result<Vec<u8>>;
}

/// In-memory [`BlobStore`] fake for tests, following the teacher's
/// `CheckpointManager::new_in_memory()` convention.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, tenant: &str, kind: BlobKind, id: &str, bytes: Vec<u8>) -> Result<()> {
        self.blobs.lock().insert(blob_key(tenant, kind, id), bytes);
        Ok(())
    }

    async fn get(&self, tenant: &str, kind: BlobKind, id: &str) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .get(&blob_key(tenant, kind, id))
            .cloned()
            .ok_or_else(|| StorageError::not_found(format!("blob {} absent", blob_key(tenant, kind, id))))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Metadata rows
// ═══════════════════════════════════════════════════════════════════════

/// `(tenant_id, full_name)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRow {
    pub id: Uuid,
    pub tenant_id: String,
    pub full_name: String,
    pub default_branch: String,
}

/// Ingestion lifecycle state: QUEUED → RUNNING → {COMPLETED | FAILED}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionState {
    Queued,
    Running,
    Completed,
    Failed,
}

impl IngestionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionState::Queued => "queued",
            IngestionState::Running => "running",
            IngestionState::Completed => "completed",
            IngestionState::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "queued" => Ok(IngestionState::Queued),
            "running" => Ok(IngestionState::Running),
            "completed" => Ok(IngestionState::Completed),
            "failed" => Ok(IngestionState::Failed),
            other => Err(StorageError::corruption(format!("invalid ingestion state {other}"))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestionState::Completed | IngestionState::Failed)
    }
}

/// Persisted lifecycle record keyed by `(repo_id, commit_sha, pr_number?)`,
/// deduplicated by `idempotency_key`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionRow {
    pub id: Uuid,
    pub idempotency_key: String,
    pub tenant_id: String,
    pub repo_id: String,
    pub commit_sha: String,
    pub pr_number: Option<i64>,
    pub state: IngestionState,
    pub head_snapshot_id: Option<Uuid>,
    pub delta_id: Option<Uuid>,
    pub score_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `(repo_id, commit_sha)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub id: Uuid,
    pub repo_id: String,
    pub commit_sha: String,
    pub branch: String,
}

/// `(base_snapshot_id, head_snapshot_id)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaRow {
    pub id: Uuid,
    pub base_snapshot_id: Uuid,
    pub head_snapshot_id: Uuid,
}

/// One row per persisted score, carrying its full JSON payload so it can be
/// served without a round-trip to the blob store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRow {
    pub id: Uuid,
    pub repo_id: String,
    pub delta_id: Uuid,
    pub base_snapshot_id: Uuid,
    pub head_snapshot_id: Uuid,
    pub pr_number: Option<i64>,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

/// One baseline per repository; overwritten last-writer-wins by `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineRow {
    pub repo_id: String,
    pub snapshot_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════
// Metadata store
// ═══════════════════════════════════════════════════════════════════════

/// Key-indexed relations for tenants, repositories, ingestions, snapshots,
/// deltas, scores and baselines (spec.md §6). Every `upsert_*` method
/// returns the existing row's fields on a uniqueness conflict rather than
/// erroring — this is what lets the ingestion orchestrator treat two
/// concurrent requests for the same key as converging on one row.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn upsert_repository(
        &self,
        tenant_id: &str,
        full_name: &str,
        default_branch: &str,
    ) -> Result<RepositoryRow>;
    async fn get_repository(&self, repo_id: &str) -> Result<Option<RepositoryRow>>;

    async fn upsert_ingestion(
        &self,
        idempotency_key: &str,
        tenant_id: &str,
        repo_id: &str,
        commit_sha: &str,
        pr_number: Option<i64>,
    ) -> Result<IngestionRow>;
    async fn get_ingestion(&self, id: Uuid) -> Result<Option<IngestionRow>>;
    async fn get_ingestion_by_key(&self, idempotency_key: &str) -> Result<Option<IngestionRow>>;
    async fn transition_ingestion(
        &self,
        id: Uuid,
        state: IngestionState,
        error_message: Option<String>,
    ) -> Result<IngestionRow>;
    async fn attach_ingestion_artifacts(
        &self,
        id: Uuid,
        head_snapshot_id: Option<Uuid>,
        delta_id: Option<Uuid>,
        score_id: Option<Uuid>,
    ) -> Result<IngestionRow>;

    async fn upsert_snapshot(
        &self,
        repo_id: &str,
        commit_sha: &str,
        snapshot_id: Uuid,
        branch: &str,
    ) -> Result<SnapshotRow>;
    async fn get_snapshot(&self, id: Uuid) -> Result<Option<SnapshotRow>>;

    async fn upsert_delta(
        &self,
        base_snapshot_id: Uuid,
        head_snapshot_id: Uuid,
        delta_id: Uuid,
    ) -> Result<DeltaRow>;
    async fn get_delta(&self, id: Uuid) -> Result<Option<DeltaRow>>;

    async fn insert_score(
        &self,
        repo_id: &str,
        delta_id: Uuid,
        base_snapshot_id: Uuid,
        head_snapshot_id: Uuid,
        pr_number: Option<i64>,
        payload: String,
    ) -> Result<ScoreRow>;
    async fn update_score_payload(&self, id: Uuid, payload: String) -> Result<ScoreRow>;
    async fn get_score(&self, id: Uuid) -> Result<Option<ScoreRow>>;
    async fn list_scores_by_repo(&self, repo_id: &str) -> Result<Vec<ScoreRow>>;

    async fn get_baseline(&self, repo_id: &str) -> Result<Option<BaselineRow>>;
    async fn set_baseline(&self, repo_id: &str, snapshot_id: Uuid) -> Result<BaselineRow>;
}

/// In-memory [`MetadataStore`] fake. A single mutex guards all tables —
/// fine for tests, where contention never matters.
#[derive(Default)]
pub struct InMemoryMetadataStore {
    inner: Mutex<InMemoryTables>,
}

#[derive(Default)]
struct InMemoryTables {
    repositories: Vec<RepositoryRow>,
    ingestions: Vec<IngestionRow>,
    snapshots: Vec<SnapshotRow>,
    deltas: Vec<DeltaRow>,
    scores: Vec<ScoreRow>,
    baselines: HashMap<String, BaselineRow>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn upsert_repository(
        &self,
        tenant_id: &str,
        full_name: &str,
        default_branch: &str,
    ) -> Result<RepositoryRow> {
        let mut tables = self.inner.lock();
        if let Some(existing) = tables
            .repositories
            .iter()
            .find(|r| r.tenant_id == tenant_id && r.full_name == full_name)
        {
            return Ok(existing.clone());
        }
        let row = RepositoryRow {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            full_name: full_name.to_string(),
            default_branch: default_branch.to_string(),
        };
        tables.repositories.push(row.clone());
        Ok(row)
    }

    async fn get_repository(&self, repo_id: &str) -> Result<Option<RepositoryRow>> {
        let tables = self.inner.lock();
        Ok(tables
            .repositories
            .iter()
            .find(|r| r.id.to_string() == repo_id || r.full_name == repo_id)
            .cloned())
    }

    async fn upsert_ingestion(
        &self,
        idempotency_key: &str,
        tenant_id: &str,
        repo_id: &str,
        commit_sha: &str,
        pr_number: Option<i64>,
    ) -> Result<IngestionRow> {
        let mut tables = self.inner.lock();
        if let Some(existing) = tables
            .ingestions
            .iter()
            .find(|i| i.idempotency_key == idempotency_key)
        {
            return Ok(existing.clone());
        }
        let now = Utc::now();
        let row = IngestionRow {
            id: Uuid::new_v4(),
            idempotency_key: idempotency_key.to_string(),
            tenant_id: tenant_id.to_string(),
            repo_id: repo_id.to_string(),
            commit_sha: commit_sha.to_string(),
            pr_number,
            state: IngestionState::Queued,
            head_snapshot_id: None,
            delta_id: None,
            score_id: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        };
        tables.ingestions.push(row.clone());
        Ok(row)
    }

    async fn get_ingestion(&self, id: Uuid) -> Result<Option<IngestionRow>> {
        let tables = self.inner.lock();
        Ok(tables.ingestions.iter().find(|i| i.id == id).cloned())
    }

    async fn get_ingestion_by_key(&self, idempotency_key: &str) -> Result<Option<IngestionRow>> {
        let tables = self.inner.lock();
        Ok(tables
            .ingestions
            .iter()
            .find(|i| i.idempotency_key == idempotency_key)
            .cloned())
    }

    async fn transition_ingestion(
        &self,
        id: Uuid,
        state: IngestionState,
        error_message: Option<String>,
    ) -> Result<IngestionRow> {
        let mut tables = self.inner.lock();
        let row = tables
            .ingestions
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| StorageError::not_found(format!("ingestion {id} absent")))?;
        row.state = state;
        row.error_message = error_message;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn attach_ingestion_artifacts(
        &self,
        id: Uuid,
        head_snapshot_id: Option<Uuid>,
        delta_id: Option<Uuid>,
        score_id: Option<Uuid>,
    ) -> Result<IngestionRow> {
        let mut tables = self.inner.lock();
        let row = tables
            .ingestions
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| StorageError::not_found(format!("ingestion {id} absent")))?;
        if head_snapshot_id.is_some() {
            row.head_snapshot_id = head_snapshot_id;
        }
        if delta_id.is_some() {
            row.delta_id = delta_id;
        }
        if score_id.is_some() {
            row.score_id = score_id;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn upsert_snapshot(
        &self,
        repo_id: &str,
        commit_sha: &str,
        snapshot_id: Uuid,
        branch: &str,
    ) -> Result<SnapshotRow> {
        let mut tables = self.inner.lock();
        if let Some(existing) = tables
            .snapshots
            .iter()
            .find(|s| s.repo_id == repo_id && s.commit_sha == commit_sha)
        {
            return Ok(existing.clone());
        }
        let row = SnapshotRow {
            id: snapshot_id,
            repo_id: repo_id.to_string(),
            commit_sha: commit_sha.to_string(),
            branch: branch.to_string(),
        };
        tables.snapshots.push(row.clone());
        Ok(row)
    }

    async fn get_snapshot(&self, id: Uuid) -> Result<Option<SnapshotRow>> {
        let tables = self.inner.lock();
        Ok(tables.snapshots.iter().find(|s| s.id == id).cloned())
    }

    async fn upsert_delta(
        &self,
        base_snapshot_id: Uuid,
        head_snapshot_id: Uuid,
        delta_id: Uuid,
    ) -> Result<DeltaRow> {
        let mut tables = self.inner.lock();
        if let Some(existing) = tables
            .deltas
            .iter()
            .find(|d| d.base_snapshot_id == base_snapshot_id && d.head_snapshot_id == head_snapshot_id)
        {
            return Ok(existing.clone());
        }
        let row = DeltaRow {
            id: delta_id,
            base_snapshot_id,
            head_snapshot_id,
        };
        tables.deltas.push(row.clone());
        Ok(row)
    }

    async fn get_delta(&self, id: Uuid) -> Result<Option<DeltaRow>> {
        let tables = self.inner.lock();
        Ok(tables.deltas.iter().find(|d| d.id == id).cloned())
    }

    async fn insert_score(
        &self,
        repo_id: &str,
        delta_id: Uuid,
        base_snapshot_id: Uuid,
        head_snapshot_id: Uuid,
        pr_number: Option<i64>,
        payload: String,
    ) -> Result<ScoreRow> {
        let mut tables = self.inner.lock();
        let row = ScoreRow {
            id: Uuid::new_v4(),
            repo_id: repo_id.to_string(),
            delta_id,
            base_snapshot_id,
            head_snapshot_id,
            pr_number,
            payload,
            created_at: Utc::now(),
        };
        tables.scores.push(row.clone());
        Ok(row)
    }

    async fn update_score_payload(&self, id: Uuid, payload: String) -> Result<ScoreRow> {
        let mut tables = self.inner.lock();
        let row = tables
            .scores
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StorageError::not_found(format!("score {id} absent")))?;
        row.payload = payload;
        Ok(row.clone())
    }

    async fn get_score(&self, id: Uuid) -> Result<Option<ScoreRow>> {
        let tables = self.inner.lock();
        Ok(tables.scores.iter().find(|s| s.id == id).cloned())
    }

    async fn list_scores_by_repo(&self, repo_id: &str) -> Result<Vec<ScoreRow>> {
        let tables = self.inner.lock();
        let mut rows: Vec<ScoreRow> = tables.scores.iter().filter(|s| s.repo_id == repo_id).cloned().collect();
        rows.sort_by_key(|s| s.created_at);
        Ok(rows)
    }

    async fn get_baseline(&self, repo_id: &str) -> Result<Option<BaselineRow>> {
        let tables = self.inner.lock();
        Ok(tables.baselines.get(repo_id).cloned())
    }

    async fn set_baseline(&self, repo_id: &str, snapshot_id: Uuid) -> Result<BaselineRow> {
        let mut tables = self.inner.lock();
        let row = BaselineRow {
            repo_id: repo_id.to_string(),
            snapshot_id,
            updated_at: Utc::now(),
        };
        // Last-writer-wins: unconditionally overwrite, matching spec.md §5's
        // "Baseline updates are last-writer-wins by wall-clock timestamp."
        tables.baselines.insert(repo_id.to_string(), row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blob_roundtrip() {
        let store = InMemoryBlobStore::new();
        store
            .put("acme", BlobKind::Snapshots, "abc", b"hello".to_vec())
            .await
            .unwrap();
        let bytes = store.get("acme", BlobKind::Snapshots, "abc").await.unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn blob_missing_is_not_found() {
        let store = InMemoryBlobStore::new();
        let err = store.get("acme", BlobKind::Deltas, "missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn ingestion_idempotency_key_convergence() {
        let store = InMemoryMetadataStore::new();
        let a = store
            .upsert_ingestion("repo:sha", "acme", "repo", "sha", None)
            .await
            .unwrap();
        let b = store
            .upsert_ingestion("repo:sha", "acme", "repo", "sha", None)
            .await
            .unwrap();
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn snapshot_uniqueness_returns_existing_id() {
        let store = InMemoryMetadataStore::new();
        let first_id = Uuid::new_v4();
        let row_a = store.upsert_snapshot("repo", "sha1", first_id, "main").await.unwrap();
        let second_id = Uuid::new_v4();
        let row_b = store.upsert_snapshot("repo", "sha1", second_id, "main").await.unwrap();
        assert_eq!(row_a.id, row_b.id);
        assert_eq!(row_b.id, first_id);
    }

    #[tokio::test]
    async fn baseline_last_writer_wins() {
        let store = InMemoryMetadataStore::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        store.set_baseline("repo", first).await.unwrap();
        let updated = store.set_baseline("repo", second).await.unwrap();
        assert_eq!(updated.snapshot_id, second);
        assert_eq!(store.get_baseline("repo").await.unwrap().unwrap().snapshot_id, second);
    }
}
