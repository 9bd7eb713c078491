//! `QueryService` — the read-time half of spec.md §2's control flow:
//! "Read-time graph queries resolve a snapshot by identifier, load it
//! into memory, and run one of four graph algorithms." Shares the
//! process-wide [`SnapshotCache`] and [`BlobStore`] with the
//! [`crate::orchestrator::Orchestrator`] so a snapshot ingested moments
//! ago is already warm for the query that follows it.

use crate::cache::SnapshotCache;
use crate::error::{OrchestratorError, Result};
use buildgraph_core::{CoreError, Snapshot};
use buildgraph_query::{
    aggregate_packages, cap_graph, ego_graph, extract_subgraph, find_paths, AggregateResult,
    Direction, EgoResult, PathsResult, SubgraphResult,
};
use buildgraph_storage::{BlobKind, BlobStore};
use std::sync::Arc;
use uuid::Uuid;

pub struct QueryService {
    blob_store: Arc<dyn BlobStore>,
    cache: Arc<SnapshotCache>,
}

impl QueryService {
    /// Constructs a service with its own, unshared snapshot cache —
    /// useful for a standalone read replica that never runs ingestion.
    pub fn new(blob_store: Arc<dyn BlobStore>, cache_capacity: usize) -> Self {
        Self {
            blob_store,
            cache: Arc::new(SnapshotCache::new(cache_capacity)),
        }
    }

    /// Constructs a service sharing an existing cache, per
    /// [`crate::orchestrator::Orchestrator::query_service`].
    pub fn with_cache(blob_store: Arc<dyn BlobStore>, cache: Arc<SnapshotCache>) -> Self {
        Self { blob_store, cache }
    }

    pub fn cached_snapshot_count(&self) -> usize {
        self.cache.len()
    }

    /// Resolves a snapshot id into a decoded [`Snapshot`], consulting the
    /// shared cache before falling back to the blob store (spec.md §5's
    /// release-lock-before-I/O protocol, via [`SnapshotCache::get_or_load`]).
    pub async fn load_snapshot(&self, tenant_id: &str, snapshot_id: Uuid) -> Result<Snapshot> {
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

    pub async fn extract_subgraph(
        &self,
        tenant_id: &str,
        snapshot_id: Uuid,
        roots: &[String],
        depth: usize,
    ) -> Result<SubgraphResult> {
        let snapshot = self.load_snapshot(tenant_id, snapshot_id).await?;
        Ok(extract_subgraph(&snapshot, roots, depth))
    }

    pub async fn cap_graph(&self, tenant_id: &str, snapshot_id: Uuid, max: usize) -> Result<SubgraphResult> {
        let snapshot = self.load_snapshot(tenant_id, snapshot_id).await?;
        Ok(cap_graph(&snapshot, max))
    }

    pub async fn ego_graph(
        &self,
        tenant_id: &str,
        snapshot_id: Uuid,
        target: &str,
        depth: usize,
        direction: Direction,
        max_nodes: usize,
    ) -> Result<EgoResult> {
        let snapshot = self.load_snapshot(tenant_id, snapshot_id).await?;
        Ok(ego_graph(&snapshot, target, depth, direction, max_nodes))
    }

    pub async fn find_paths(
        &self,
        tenant_id: &str,
        snapshot_id: Uuid,
        from: &str,
        to: &str,
        max_paths: usize,
    ) -> Result<PathsResult> {
        let snapshot = self.load_snapshot(tenant_id, snapshot_id).await?;
        Ok(find_paths(&snapshot, from, to, max_paths))
    }

    pub async fn aggregate_packages(
        &self,
        tenant_id: &str,
        snapshot_id: Uuid,
        hide_tests: bool,
        hide_external: bool,
        min_edge_weight: usize,
        max_pkgs: usize,
    ) -> Result<AggregateResult> {
        let snapshot = self.load_snapshot(tenant_id, snapshot_id).await?;
        Ok(aggregate_packages(&snapshot, hide_tests, hide_external, min_edge_weight, max_pkgs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildgraph_core::{Edge, EdgeType, Node};
    use buildgraph_storage::InMemoryBlobStore;

    async fn seeded_service() -> (QueryService, Uuid) {
        let blob_store: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
        let snapshot = Snapshot::new("c1", "main")
            .with_nodes([Node::new("//a:a", "go_library"), Node::new("//b:b", "go_library")])
            .with_edges([Edge::new("//a:a", "//b:b", EdgeType::Compile)]);
        let id = snapshot.id;
        let bytes = snapshot.to_json().unwrap().into_bytes();
        blob_store.put("acme", BlobKind::Snapshots, &id.to_string(), bytes).await.unwrap();
        (QueryService::new(blob_store, 10), id)
    }

    #[tokio::test]
    async fn resolves_snapshot_and_runs_ego_graph() {
        let (service, id) = seeded_service().await;
        let result = service.ego_graph("acme", id, "//a:a", 5, Direction::Both, 500).await.unwrap();
        assert_eq!(result.nodes.len(), 2);
        assert!(!result.truncated);
    }

    #[tokio::test]
    async fn second_query_hits_the_cache() {
        let (service, id) = seeded_service().await;
        service.ego_graph("acme", id, "//a:a", 1, Direction::Deps, 500).await.unwrap();
        assert_eq!(service.cached_snapshot_count(), 1);
        // Repeating the query must not require the blob to still exist.
        service.find_paths("acme", id, "//a:a", "//b:b", 10).await.unwrap();
    }

    #[tokio::test]
    async fn missing_snapshot_surfaces_not_found() {
        let blob_store: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
        let service = QueryService::new(blob_store, 10);
        let err = service.cap_graph("acme", Uuid::new_v4(), 10).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Storage(_)));
    }
}
