//! Forward/reverse adjacency built once per query from a Snapshot's edges.

use buildgraph_core::Snapshot;
use std::collections::HashMap;

pub struct Adjacency<'a> {
    forward: HashMap<&'a str, Vec<&'a str>>,
    reverse: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> Adjacency<'a> {
    pub fn build(snapshot: &'a Snapshot) -> Self {
        let mut forward: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut reverse: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &snapshot.edges {
            forward.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
            reverse.entry(edge.to.as_str()).or_default().push(edge.from.as_str());
        }
        Self { forward, reverse }
    }

    pub fn forward_of<'s>(&'s self, key: &str) -> impl Iterator<Item = &'a str> + 's {
        self.forward.get(key).into_iter().flatten().copied()
    }

    pub fn reverse_of<'s>(&'s self, key: &str) -> impl Iterator<Item = &'a str> + 's {
        self.reverse.get(key).into_iter().flatten().copied()
    }
}

/// Induced edges: every edge in `snapshot` whose both endpoints are in `visited`.
pub fn induced_edges(
    snapshot: &Snapshot,
    visited: &std::collections::HashSet<&str>,
) -> Vec<buildgraph_core::Edge> {
    snapshot
        .edges
        .iter()
        .filter(|e| visited.contains(e.from.as_str()) && visited.contains(e.to.as_str()))
        .cloned()
        .collect()
}
