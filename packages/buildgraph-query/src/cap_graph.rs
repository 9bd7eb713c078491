//! `CapGraph(snapshot, max)` — degree-capped sampling.

use crate::adjacency::induced_edges;
use crate::extract_subgraph::SubgraphResult;
use buildgraph_core::{graph, Snapshot};
use std::collections::HashSet;

pub fn cap_graph(snapshot: &Snapshot, max: usize) -> SubgraphResult {
    if snapshot.nodes.len() <= max {
        return SubgraphResult {
            nodes: snapshot.nodes.clone(),
            edges: snapshot.edges.clone(),
        };
    }

    let in_deg = graph::in_degree(snapshot, false);
    let out_deg = graph::out_degree(snapshot, false);

    let mut ranked: Vec<(&str, u64)> = snapshot
        .nodes
        .keys()
        .map(|key| {
            let degree = *in_deg.get(key.as_str()).unwrap_or(&0) as u64
                + *out_deg.get(key.as_str()).unwrap_or(&0) as u64;
            (key.as_str(), degree)
        })
        .collect();
    // Tie-break is best-effort; callers must not depend on ordering beyond
    // §8's invariants.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(max);

    let kept: HashSet<&str> = ranked.into_iter().map(|(key, _)| key).collect();
    let nodes = kept
        .iter()
        .filter_map(|key| snapshot.nodes.get(*key).map(|n| (key.to_string(), n.clone())))
        .collect();
    let edges = induced_edges(snapshot, &kept);

    SubgraphResult { nodes, edges }
}
