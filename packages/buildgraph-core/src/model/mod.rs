//! Data model: Node, Edge, Snapshot, Delta, ScoreResult.

mod delta;
mod edge;
mod node;
mod score;
mod snapshot;

pub use delta::{compute_delta, Delta, DeltaStats};
pub use edge::{Edge, EdgeType};
pub use node::Node;
pub use score::{
    EvidenceItem, Grade, Hotspot, MetricResult, ScoreResult, Severity, SuggestedAction,
};
pub use snapshot::{Snapshot, SnapshotStats};
