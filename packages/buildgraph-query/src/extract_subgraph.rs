//! `ExtractSubgraph(roots, depth)` — breadth-first expansion in both
//! directions from a root set matched by exact key or string-prefix.

use crate::adjacency::{induced_edges, Adjacency};
use crate::resolve::match_roots;
use buildgraph_core::{Edge, Node, Snapshot};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct SubgraphResult {
    pub nodes: HashMap<String, Node>,
    pub edges: Vec<Edge>,
}

pub fn extract_subgraph(snapshot: &Snapshot, roots: &[String], depth: usize) -> SubgraphResult {
    let seeds = match_roots(snapshot, roots);
    if seeds.is_empty() {
        return SubgraphResult::default();
    }

    let adjacency = Adjacency::build(snapshot);
    let mut visited: HashSet<&str> = seeds.clone();
    let mut frontier: Vec<&str> = seeds.into_iter().collect();

    for _ in 0..depth {
        let mut next = Vec::new();
        for node in &frontier {
            let neighbors: Vec<&str> = adjacency
                .forward_of(node)
                .chain(adjacency.reverse_of(node))
                .collect();
            for neighbor in neighbors {
                if visited.insert(neighbor) {
                    next.push(neighbor);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    let nodes = visited
        .iter()
        .filter_map(|key| snapshot.nodes.get(*key).map(|n| (key.to_string(), n.clone())))
        .collect();
    let edges = induced_edges(snapshot, &visited);

    SubgraphResult { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildgraph_core::{EdgeType, Node as CoreNode};

    fn chain_snapshot(n: usize) -> Snapshot {
        let nodes: Vec<CoreNode> = (0..n).map(|i| CoreNode::new(format!("//c:n{i}"), "go_library")).collect();
        let edges: Vec<Edge> = (0..n - 1)
            .map(|i| Edge::new(format!("//c:n{i}"), format!("//c:n{}", i + 1), EdgeType::Compile))
            .collect();
        Snapshot::new("c1", "main").with_nodes(nodes).with_edges(edges)
    }

    #[test]
    fn expands_both_directions_for_depth_rounds() {
        let snap = chain_snapshot(6);
        let result = extract_subgraph(&snap, &["//c:n3".to_string()], 2);
        // n1..n5 reachable within 2 hops of n3 in either direction, plus n3 itself.
        assert!(result.nodes.contains_key("//c:n1"));
        assert!(result.nodes.contains_key("//c:n5"));
        assert!(!result.nodes.contains_key("//c:n0"));
    }

    #[test]
    fn empty_when_no_root_matches() {
        let snap = chain_snapshot(3);
        let result = extract_subgraph(&snap, &["//missing".to_string()], 2);
        assert!(result.nodes.is_empty());
        assert!(result.edges.is_empty());
    }

    #[test]
    fn query_purity_repeated_calls_agree() {
        let snap = chain_snapshot(10);
        let a = extract_subgraph(&snap, &["//c:n5".to_string()], 3);
        let b = extract_subgraph(&snap, &["//c:n5".to_string()], 3);
        let mut a_keys: Vec<&String> = a.nodes.keys().collect();
        let mut b_keys: Vec<&String> = b.nodes.keys().collect();
        a_keys.sort();
        b_keys.sort();
        assert_eq!(a_keys, b_keys);
    }
}
