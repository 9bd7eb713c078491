//! `Orchestrator` — the ingestion pipeline (spec.md §4.5), grounded on the
//! teacher's `PipelineOrchestrator`: one entry point (`process`) drives a
//! fixed sequence of capability calls and always leaves the ingestion row
//! in a terminal state.

use crate::cache::SnapshotCache;
use crate::capability::{Extractor, ExtractionRequest, RefResolver, TenantDirectory};
use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, Result};
use crate::ingestion::{validate_transition, IngestionRequest, IngestionResponse};
use buildgraph_core::{compute_delta, CoreError, Delta, Snapshot};
use buildgraph_scoring::ScoringEngine;
use buildgraph_storage::{BlobKind, BlobStore, IngestionRow, IngestionState, MetadataStore, ScoreRow};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of a re-score backfill sweep: how many score rows were
/// recomputed in place and how many failed (and were skipped) along
/// the way. Never aborts the sweep on a single row's failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescoreReport {
    pub rescored: usize,
    pub errors: usize,
}

/// Composes the five named capabilities with the scoring engine and the
/// process-wide snapshot cache. Construction wires in real adapters;
/// tests wire in the in-memory fakes from [`crate::capability`] and
/// `buildgraph_storage`.
pub struct Orchestrator {
    extractor: Arc<dyn Extractor>,
    ref_resolver: Arc<dyn RefResolver>,
    tenant_directory: Arc<dyn TenantDirectory>,
    blob_store: Arc<dyn BlobStore>,
    metadata_store: Arc<dyn MetadataStore>,
    scoring_engine: ScoringEngine,
    cache: Arc<SnapshotCache>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        ref_resolver: Arc<dyn RefResolver>,
        tenant_directory: Arc<dyn TenantDirectory>,
        blob_store: Arc<dyn BlobStore>,
        metadata_store: Arc<dyn MetadataStore>,
        scoring_engine: ScoringEngine,
        config: OrchestratorConfig,
    ) -> Self {
        let cache = Arc::new(SnapshotCache::new(config.snapshot_cache_capacity));
        Self {
            extractor,
            ref_resolver,
            tenant_directory,
            blob_store,
            metadata_store,
            scoring_engine,
            cache,
            config,
        }
    }

    /// Resolves a webhook installation id to its owning tenant. Exposed
    /// for the HTTP boundary layer, which constructs `IngestionRequest`
    /// before calling [`Self::process`].
    pub async fn resolve_tenant(&self, installation_id: &str) -> Result<String> {
        self.tenant_directory.tenant_for_installation(installation_id).await
    }

    pub fn cached_snapshot_count(&self) -> usize {
        self.cache.len()
    }

    /// Builds a [`crate::query_service::QueryService`] sharing this
    /// orchestrator's blob store and process-wide snapshot cache, per
    /// spec.md §2's "read-time graph queries resolve a snapshot by
    /// identifier, load it into memory, and run one of four graph
    /// algorithms" control flow.
    pub fn query_service(&self) -> crate::query_service::QueryService {
        crate::query_service::QueryService::with_cache(self.blob_store.clone(), self.cache.clone())
    }

    /// Drives one ingestion to completion. Idempotent on `request`'s
    /// derived key: a second call with the same tenant/repo/commit/PR
    /// converges on the first call's row and, once it reaches COMPLETED,
    /// replays that row's result rather than re-running the pipeline.
    pub async fn process(&self, request: IngestionRequest) -> Result<IngestionResponse> {
        let repo = self
            .metadata_store
            .upsert_repository(&request.tenant_id, &request.repo_full_name, &request.default_branch)
            .await?;
        let repo_id = repo.id.to_string();

        let idempotency_key = request.idempotency_key();
        let row = self
            .metadata_store
            .upsert_ingestion(
                &idempotency_key,
                &request.tenant_id,
                &repo_id,
                &request.commit_sha,
                request.pr_number,
            )
            .await?;

        match row.state {
            IngestionState::Completed => return self.response_from_row(&row).await,
            IngestionState::Running => {
                return Err(OrchestratorError::invalid_input(format!(
                    "ingestion {} for key {idempotency_key} is already running",
                    row.id
                )))
            }
            IngestionState::Failed => {
                return Err(OrchestratorError::invalid_input(format!(
                    "ingestion {} for key {idempotency_key} previously failed: {}",
                    row.id,
                    row.error_message.clone().unwrap_or_default()
                )))
            }
            IngestionState::Queued => {}
        }

        validate_transition(IngestionState::Queued, IngestionState::Running)?;
        self.metadata_store
            .transition_ingestion(row.id, IngestionState::Running, None)
            .await?;

        info!(ingestion_id = %row.id, repo = %request.repo_full_name, commit = %request.commit_sha, "ingestion started");

        match self.run_pipeline(&request, &repo_id, row.id).await {
            Ok(response) => {
                self.metadata_store
                    .transition_ingestion(row.id, IngestionState::Completed, None)
                    .await?;
                info!(ingestion_id = %row.id, "ingestion completed");
                Ok(response)
            }
            Err(OrchestratorError::Cancelled) => {
                // spec.md §5: cancellation abandons outstanding I/O and
                // leaves the row at RUNNING — a caller retry observes the
                // idempotency key and decides, rather than this call
                // forcing a terminal state on a request it never finished.
                warn!(ingestion_id = %row.id, "ingestion cancelled, leaving row RUNNING");
                Err(OrchestratorError::Cancelled)
            }
            Err(err) => {
                warn!(ingestion_id = %row.id, error = %err, "ingestion failed");
                // Best effort: if the row can't be marked FAILED the caller
                // still sees the original error; a later request observing
                // this key will find it stuck at RUNNING and retry.
                let _ = self
                    .metadata_store
                    .transition_ingestion(row.id, IngestionState::Failed, Some(err.to_string()))
                    .await;
                Err(err)
            }
        }
    }

    /// Checked before every blocking call in [`Self::run_pipeline`] (spec.md
    /// §5): a cancelled request abandons the rest of the pipeline without
    /// touching the ingestion row's terminal state.
    fn check_cancelled(request: &IngestionRequest) -> Result<()> {
        if request.cancellation.is_cancelled() {
            Err(OrchestratorError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn run_pipeline(
        &self,
        request: &IngestionRequest,
        repo_id: &str,
        ingestion_id: Uuid,
    ) -> Result<IngestionResponse> {
        let deadline = request.deadline.unwrap_or(self.config.default_extraction_deadline);

        Self::check_cancelled(request)?;
        let baseline_snapshot_id = match self.metadata_store.get_baseline(repo_id).await? {
            Some(baseline) => baseline.snapshot_id,
            None => {
                Self::check_cancelled(request)?;
                let base_commit_sha = self
                    .ref_resolver
                    .resolve(&request.repo_full_name, &request.default_branch)
                    .await?;
                Self::check_cancelled(request)?;
                let base_snapshot = self
                    .extractor
                    .extract(ExtractionRequest::full(base_commit_sha.clone(), deadline))
                    .await?;
                let base_row = self
                    .store_snapshot(
                        &request.tenant_id,
                        repo_id,
                        &base_commit_sha,
                        &base_snapshot,
                        &request.default_branch,
                    )
                    .await?;
                self.metadata_store.set_baseline(repo_id, base_row.id).await?;
                base_row.id
            }
        };

        Self::check_cancelled(request)?;
        let mut head_snapshot = self
            .extractor
            .extract(ExtractionRequest::full(request.commit_sha.clone(), deadline))
            .await?;
        head_snapshot.branch = request.branch.clone();
        let head_row = self
            .store_snapshot(
                &request.tenant_id,
                repo_id,
                &request.commit_sha,
                &head_snapshot,
                &request.branch,
            )
            .await?;

        Self::check_cancelled(request)?;
        let base_snapshot = self.load_snapshot(&request.tenant_id, baseline_snapshot_id).await?;

        let delta = compute_delta(&base_snapshot, &head_snapshot);
        Self::check_cancelled(request)?;
        let delta_row = self.store_delta(&request.tenant_id, &delta).await?;

        let score = self.scoring_engine.score(&delta, &base_snapshot, &head_snapshot);
        Self::check_cancelled(request)?;
        let score_row = self
            .store_score(repo_id, delta_row.id, baseline_snapshot_id, head_row.id, request.pr_number, &score)
            .await?;

        self.metadata_store
            .attach_ingestion_artifacts(ingestion_id, Some(head_row.id), Some(delta_row.id), Some(score_row.id))
            .await?;

        if request.is_default_branch() {
            self.metadata_store.set_baseline(repo_id, head_row.id).await?;
        }

        Ok(IngestionResponse {
            snapshot_id: head_row.id,
            base_snapshot_id: Some(baseline_snapshot_id),
            delta_id: Some(delta_row.id),
            score_id: Some(score_row.id),
        })
    }

    /// Re-scores every score row for `repo_id`, reloading snapshots and
    /// recomputing the delta if its blob is missing or corrupt. Reports
    /// `{rescored, errors}` and never aborts the sweep on a single row's
    /// failure (spec.md §4.5 backfill contract).
    pub async fn rescore_repo(&self, tenant_id: &str, repo_id: &str) -> Result<RescoreReport> {
        let scores = self.metadata_store.list_scores_by_repo(repo_id).await?;
        let mut report = RescoreReport::default();

        for score_row in scores.into_iter().take(self.config.max_rescore_batch) {
            match self.rescore_one(tenant_id, &score_row).await {
                Ok(()) => report.rescored += 1,
                Err(err) => {
                    warn!(score_id = %score_row.id, error = %err, "rescore failed for row, skipping");
                    report.errors += 1;
                }
            }
        }

        Ok(report)
    }

    async fn rescore_one(&self, tenant_id: &str, score_row: &ScoreRow) -> Result<()> {
        let base_snapshot = self.load_snapshot(tenant_id, score_row.base_snapshot_id).await?;
        let head_snapshot = self.load_snapshot(tenant_id, score_row.head_snapshot_id).await?;

        let delta = match self.load_delta(tenant_id, score_row.delta_id).await {
            Ok(delta) => delta,
            Err(_) => compute_delta(&base_snapshot, &head_snapshot),
        };

        let score = self.scoring_engine.score(&delta, &base_snapshot, &head_snapshot);
        let payload = serde_json::to_string(&score).map_err(CoreError::from)?;
        self.metadata_store.update_score_payload(score_row.id, payload).await?;
        Ok(())
    }

    async fn response_from_row(&self, row: &IngestionRow) -> Result<IngestionResponse> {
        let snapshot_id = row
            .head_snapshot_id
            .ok_or_else(|| OrchestratorError::not_found(format!("completed ingestion {} missing head snapshot", row.id)))?;
        let base_snapshot_id = match row.delta_id {
            Some(delta_id) => self.metadata_store.get_delta(delta_id).await?.map(|d| d.base_snapshot_id),
            None => None,
        };
        Ok(IngestionResponse {
            snapshot_id,
            base_snapshot_id,
            delta_id: row.delta_id,
            score_id: row.score_id,
        })
    }

    async fn store_snapshot(
        &self,
        tenant_id: &str,
        repo_id: &str,
        commit_sha: &str,
        snapshot: &Snapshot,
        branch: &str,
    ) -> Result<buildgraph_storage::SnapshotRow> {
        let bytes = snapshot.to_json().map_err(OrchestratorError::from)?.into_bytes();
        self.blob_store
            .put(tenant_id, BlobKind::Snapshots, &snapshot.id.to_string(), bytes)
            .await?;
        let row = self
            .metadata_store
            .upsert_snapshot(repo_id, commit_sha, snapshot.id, branch)
            .await?;
        self.cache.insert(row.id, snapshot.clone());
        Ok(row)
    }

    async fn store_delta(&self, tenant_id: &str, delta: &Delta) -> Result<buildgraph_storage::DeltaRow> {
        let base_id = delta
            .base_snapshot_id
            .ok_or_else(|| OrchestratorError::invalid_input("delta missing base_snapshot_id"))?;
        let head_id = delta
            .head_snapshot_id
            .ok_or_else(|| OrchestratorError::invalid_input("delta missing head_snapshot_id"))?;
        let delta_id = Uuid::new_v4();
        let bytes = serde_json::to_vec(delta).map_err(CoreError::from)?;
        self.blob_store.put(tenant_id, BlobKind::Deltas, &delta_id.to_string(), bytes).await?;
        let row = self.metadata_store.upsert_delta(base_id, head_id, delta_id).await?;
        Ok(row)
    }

    async fn store_score(
        &self,
        repo_id: &str,
        delta_id: Uuid,
        base_snapshot_id: Uuid,
        head_snapshot_id: Uuid,
        pr_number: Option<i64>,
        score: &buildgraph_core::ScoreResult,
    ) -> Result<ScoreRow> {
        let payload = serde_json::to_string(score).map_err(CoreError::from)?;
        let row = self
            .metadata_store
            .insert_score(repo_id, delta_id, base_snapshot_id, head_snapshot_id, pr_number, payload)
            .await?;
        Ok(row)
    }

    async fn load_snapshot(&self, tenant_id: &str, snapshot_id: Uuid) -> Result<Snapshot> {
        let blob_store = self.blob_store.clone();
        let tenant_id = tenant_id.to_string();
        self.cache
            .get_or_load(snapshot_id, || async move {
                let bytes = blob_store.get(&tenant_id, BlobKind::Snapshots, &snapshot_id.to_string()).await?;
                let json = String::from_utf8(bytes)
                    .map_err(|e| OrchestratorError::Core(CoreError::InvalidSnapshot(e.to_string())))?;
                Snapshot::from_json(&json).map_err(OrchestratorError::from)
            })
            .await
    }

    async fn load_delta(&self, tenant_id: &str, delta_id: Uuid) -> Result<Delta> {
        let bytes = self.blob_store.get(tenant_id, BlobKind::Deltas, &delta_id.to_string()).await?;
        let delta: Delta = serde_json::from_slice(&bytes).map_err(CoreError::from)?;
        Ok(delta)
    }
}
