//! Delta — the structural difference between a base and head snapshot.

use super::edge::Edge;
use super::node::Node;
use super::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Counts carried forward on a computed Delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeltaStats {
    pub added_nodes: usize,
    pub removed_nodes: usize,
    pub added_edges: usize,
    pub removed_edges: usize,
    /// Supplied externally by a change-detection helper; 0 if unknown.
    #[serde(default)]
    pub impacted_targets: usize,
}

/// The structural difference between a base and head snapshot.
///
/// Ordering of the sequences is unspecified; callers must not depend on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    pub base_snapshot_id: Option<uuid::Uuid>,
    pub head_snapshot_id: Option<uuid::Uuid>,
    pub added_nodes: Vec<Node>,
    pub removed_nodes: Vec<Node>,
    pub added_edges: Vec<Edge>,
    pub removed_edges: Vec<Edge>,
    pub stats: DeltaStats,
}

/// Compute the structural difference between `base` and `head`.
///
/// Pure and deterministic given identical input maps.
/// `compute_delta(s, s)` yields an all-empty, all-zero Delta.
pub fn compute_delta(base: &Snapshot, head: &Snapshot) -> Delta {
    let mut added_nodes = Vec::new();
    let mut removed_nodes = Vec::new();

    for (key, node) in &head.nodes {
        if !base.nodes.contains_key(key) {
            added_nodes.push(node.clone());
        }
    }
    for (key, node) in &base.nodes {
        if !head.nodes.contains_key(key) {
            removed_nodes.push(node.clone());
        }
    }

    let base_edges: HashMap<String, &Edge> =
        base.edges.iter().map(|e| (e.edge_key(), e)).collect();
    let head_edges: HashMap<String, &Edge> =
        head.edges.iter().map(|e| (e.edge_key(), e)).collect();

    let mut added_edges = Vec::new();
    let mut removed_edges = Vec::new();

    for (key, edge) in &head_edges {
        if !base_edges.contains_key(key) {
            added_edges.push((*edge).clone());
        }
    }
    for (key, edge) in &base_edges {
        if !head_edges.contains_key(key) {
            removed_edges.push((*edge).clone());
        }
    }

    let stats = DeltaStats {
        added_nodes: added_nodes.len(),
        removed_nodes: removed_nodes.len(),
        added_edges: added_edges.len(),
        removed_edges: removed_edges.len(),
        impacted_targets: 0,
    };

    Delta {
        base_snapshot_id: Some(base.id),
        head_snapshot_id: Some(head.id),
        added_nodes,
        removed_nodes,
        added_edges,
        removed_edges,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::edge::EdgeType;

    fn snap(commit: &str) -> Snapshot {
        Snapshot::new(commit, "main")
    }

    #[test]
    fn delta_symmetry_same_snapshot_is_empty() {
        let s = snap("c1").with_nodes([Node::new("//a:a", "go_library")]);
        let delta = compute_delta(&s, &s);
        assert!(delta.added_nodes.is_empty());
        assert!(delta.removed_nodes.is_empty());
        assert!(delta.added_edges.is_empty());
        assert!(delta.removed_edges.is_empty());
        assert_eq!(delta.stats.added_nodes, 0);
    }

    #[test]
    fn delta_completeness_nodes() {
        let base = snap("c1").with_nodes([Node::new("//a:a", "go_library")]);
        let head = snap("c2")
            .with_nodes([Node::new("//a:a", "go_library"), Node::new("//b:b", "go_library")]);
        let delta = compute_delta(&base, &head);
        assert_eq!(delta.added_nodes.len(), 1);
        assert_eq!(delta.added_nodes[0].key, "//b:b");
        assert!(delta.removed_nodes.is_empty());
    }

    #[test]
    fn delta_completeness_edges_keyed_by_triple() {
        let base = snap("c1").with_nodes([Node::new("//a:a", "l"), Node::new("//b:b", "l")]);
        let head = snap("c2")
            .with_nodes([Node::new("//a:a", "l"), Node::new("//b:b", "l")])
            .with_edges([Edge::new("//a:a", "//b:b", EdgeType::Compile)]);
        let delta = compute_delta(&base, &head);
        assert_eq!(delta.added_edges.len(), 1);
        assert_eq!(delta.stats.added_edges, 1);
    }
}
