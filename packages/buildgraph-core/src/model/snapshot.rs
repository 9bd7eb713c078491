//! Snapshot — the full target graph at one commit.

use super::edge::Edge;
use super::node::Node;
use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Aggregate counts captured at extraction time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub package_count: usize,
    pub extraction_duration_ms: u64,
}

/// The full target graph at one commit.
///
/// Invariant: every `edge.from`/`edge.to` appears in `nodes`, unless
/// `partial == true` (the snapshot was extracted in scoped mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub commit_sha: String,
    pub branch: String,
    #[serde(default)]
    pub partial: bool,
    pub extracted_at: DateTime<Utc>,
    pub nodes: HashMap<String, Node>,
    pub edges: Vec<Edge>,
    pub stats: SnapshotStats,
}

impl Snapshot {
    pub fn new(commit_sha: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            commit_sha: commit_sha.into(),
            branch: branch.into(),
            partial: false,
            extracted_at: Utc::now(),
            nodes: HashMap::new(),
            edges: Vec::new(),
            stats: SnapshotStats::default(),
        }
    }

    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.nodes = nodes.into_iter().map(|n| (n.key.clone(), n)).collect();
        self
    }

    pub fn with_edges(mut self, edges: impl IntoIterator<Item = Edge>) -> Self {
        self.edges = edges.into_iter().collect();
        self
    }

    /// Recompute `stats` from the current `nodes`/`edges` contents.
    pub fn recompute_stats(&mut self) {
        let package_count = crate::graph::packages(self).len();
        self.stats.node_count = self.nodes.len();
        self.stats.edge_count = self.edges.len();
        self.stats.package_count = package_count;
    }

    /// Validate the `edge.from`/`edge.to` ⊆ `nodes` invariant. A partial
    /// snapshot is exempt, per spec.
    pub fn validate(&self) -> Result<()> {
        if self.partial {
            return Ok(());
        }
        for edge in &self.edges {
            if !self.nodes.contains_key(&edge.from) {
                return Err(CoreError::InvalidSnapshot(format!(
                    "edge source {} not present in nodes",
                    edge.from
                )));
            }
            if !self.nodes.contains_key(&edge.to) {
                return Err(CoreError::InvalidSnapshot(format!(
                    "edge target {} not present in nodes",
                    edge.to
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::edge::EdgeType;

    #[test]
    fn validate_rejects_dangling_edge() {
        let snap = Snapshot::new("deadbeef", "main")
            .with_nodes([Node::new("//a:a", "go_library")])
            .with_edges([Edge::new("//a:a", "//b:b", EdgeType::Compile)]);
        assert!(snap.validate().is_err());
    }

    #[test]
    fn validate_allows_partial_dangling_edge() {
        let mut snap = Snapshot::new("deadbeef", "main")
            .with_nodes([Node::new("//a:a", "go_library")])
            .with_edges([Edge::new("//a:a", "//b:b", EdgeType::Compile)]);
        snap.partial = true;
        assert!(snap.validate().is_ok());
    }

    #[test]
    fn json_roundtrip() {
        let snap = Snapshot::new("deadbeef", "main").with_nodes([Node::new("//a:a", "go_library")]);
        let json = snap.to_json().unwrap();
        let back = Snapshot::from_json(&json).unwrap();
        assert_eq!(back.commit_sha, "deadbeef");
        assert_eq!(back.nodes.len(), 1);
    }
}
