//! `EgoGraph(target, depth, direction, max_nodes)`.

use crate::adjacency::{induced_edges, Adjacency};
use crate::resolve::resolve_target;
use buildgraph_core::{Edge, Node, Snapshot};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Deps,
    Rdeps,
    Both,
}

#[derive(Debug, Clone, Default)]
pub struct EgoResult {
    pub nodes: HashMap<String, Node>,
    pub edges: Vec<Edge>,
    pub truncated: bool,
}

pub const DEFAULT_MAX_NODES: usize = 500;

pub fn ego_graph(
    snapshot: &Snapshot,
    target: &str,
    depth: usize,
    direction: Direction,
    max_nodes: usize,
) -> EgoResult {
    let seeds = resolve_target(snapshot, target);
    if seeds.is_empty() {
        return EgoResult::default();
    }

    let adjacency = Adjacency::build(snapshot);
    let mut visited: HashSet<&str> = HashSet::new();
    let mut frontier: Vec<&str> = Vec::new();
    let mut truncated = false;

    for seed in seeds {
        if visited.len() >= max_nodes {
            truncated = true;
            break;
        }
        visited.insert(seed);
        frontier.push(seed);
    }

    if !truncated {
        'rounds: for _ in 0..depth {
            let mut next = Vec::new();
            for node in &frontier {
                let mut neighbors: Vec<&str> = Vec::new();
                if matches!(direction, Direction::Deps | Direction::Both) {
                    neighbors.extend(adjacency.forward_of(node));
                }
                if matches!(direction, Direction::Rdeps | Direction::Both) {
                    neighbors.extend(adjacency.reverse_of(node));
                }
                for neighbor in neighbors {
                    if visited.contains(neighbor) {
                        continue;
                    }
                    visited.insert(neighbor);
                    next.push(*neighbor);
                    if visited.len() >= max_nodes {
                        truncated = true;
                        break 'rounds;
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
    }

    let nodes = visited
        .iter()
        .filter_map(|key| snapshot.nodes.get(*key).map(|n| (key.to_string(), n.clone())))
        .collect();
    let edges = induced_edges(snapshot, &visited);

    EgoResult { nodes, edges, truncated }
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
    fn s5_ego_truncation() {
        let snap = chain_snapshot(1001);
        let result = ego_graph(&snap, "//c:n0", 1000, Direction::Deps, 500);
        assert!(result.truncated);
        assert_eq!(result.nodes.len(), 500);
    }

    #[test]
    fn no_match_returns_empty_untruncated() {
        let snap = chain_snapshot(3);
        let result = ego_graph(&snap, "//missing", 2, Direction::Both, 500);
        assert!(result.nodes.is_empty());
        assert!(!result.truncated);
    }

    #[test]
    fn direction_deps_only_expands_forward() {
        let snap = chain_snapshot(5);
        let result = ego_graph(&snap, "//c:n2", 10, Direction::Deps, 500);
        assert!(result.nodes.contains_key("//c:n3"));
        assert!(result.nodes.contains_key("//c:n4"));
        assert!(!result.nodes.contains_key("//c:n1"));
        assert!(!result.nodes.contains_key("//c:n0"));
    }
}
