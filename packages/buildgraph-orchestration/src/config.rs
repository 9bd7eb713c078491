//! Orchestrator configuration, mirroring the teacher's `StageConfig::default()`.

use std::time::Duration;

/// Tunables for the ingestion orchestrator. All bounded with sane
/// defaults; nothing here is required to run the pipeline against the
/// in-memory fakes.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Snapshot LRU cache capacity (spec.md §5 default: 20).
    pub snapshot_cache_capacity: usize,
    /// Deadline handed to the extractor when the request doesn't carry
    /// its own. Bounded by, never exceeding, the request's own deadline.
    pub default_extraction_deadline: Duration,
    /// Upper bound on how many score rows a single re-score sweep will
    /// touch before it reports partial results rather than scanning the
    /// whole repo history.
    pub max_rescore_batch: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            snapshot_cache_capacity: 20,
            default_extraction_deadline: Duration::from_secs(60),
            max_rescore_batch: 500,
        }
    }
}
