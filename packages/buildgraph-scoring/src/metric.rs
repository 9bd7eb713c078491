//! The `Metric` capability — independent values implementing the same
//! trait; the engine is a simple reducer over a sequence of them. Adding a
//! metric requires only adding an implementation and registering it, no
//! inheritance involved.

use buildgraph_core::{MetricResult, Snapshot};

pub trait Metric {
    /// Stable machine-readable identifier (e.g. `"cross_package_deps"`).
    fn key(&self) -> &str;

    /// Human-readable name surfaced in the breakdown.
    fn name(&self) -> &str;

    /// Evaluate this metric over an already-computed delta. Expected to be
    /// a total function: every input the engine passes it must produce a
    /// result, never panic.
    fn evaluate(
        &self,
        delta: &buildgraph_core::Delta,
        base: &Snapshot,
        head: &Snapshot,
    ) -> MetricResult;
}
