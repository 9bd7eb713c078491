//! buildgraph-core: the shared data model (Node, Edge, Snapshot, Delta,
//! ScoreResult) and the pure graph operations other crates build on.
//!
//! Everything here is synchronous and side-effect free — no I/O, no
//! network, no filesystem. Storage, scoring and query engines depend on
//! this crate, never the other way around.

pub mod error;
pub mod graph;
pub mod model;

pub use error::{CoreError, Result};
pub use model::{
    compute_delta, Delta, DeltaStats, Edge, EdgeType, EvidenceItem, Grade, Hotspot, MetricResult,
    Node, ScoreResult, Severity, Snapshot, SnapshotStats, SuggestedAction,
};
