//! `FindPaths(from, to, max_paths)` — multi-parent BFS shortest-path
//! enumeration.

use crate::adjacency::Adjacency;
use crate::resolve::resolve_target;
use buildgraph_core::{Edge, Node, Snapshot};
use std::collections::{HashMap, HashSet, VecDeque};

pub const DEFAULT_MAX_PATHS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct PathsResult {
    pub paths: Vec<Vec<String>>,
    pub nodes: HashMap<String, Node>,
    pub edges: Vec<Edge>,
    pub from: String,
    pub to: String,
    pub path_length: usize,
}

pub fn find_paths(snapshot: &Snapshot, from: &str, to: &str, max_paths: usize) -> PathsResult {
    let mut result = PathsResult {
        from: from.to_string(),
        to: to.to_string(),
        ..Default::default()
    };

    let from_seeds = resolve_target(snapshot, from);
    let to_seeds = resolve_target(snapshot, to);
    if from_seeds.is_empty() || to_seeds.is_empty() {
        return result;
    }

    let adjacency = Adjacency::build(snapshot);
    let mut dist: HashMap<&str, usize> = HashMap::new();
    let mut parents: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

    for &seed in &from_seeds {
        dist.insert(seed, 0);
        queue.push_back((seed, 0));
    }

    let mut found_depth: Option<usize> = None;
    for &seed in &from_seeds {
        if to_seeds.contains(seed) {
            found_depth = Some(0);
            break;
        }
    }

    while let Some((node, d)) = queue.pop_front() {
        if let Some(fd) = found_depth {
            if d > fd {
                break;
            }
        }
        if found_depth.is_none() && to_seeds.contains(node) {
            found_depth = Some(d);
        }
        for neighbor in adjacency.forward_of(node) {
            match dist.get(neighbor) {
                None => {
                    dist.insert(neighbor, d + 1);
                    parents.entry(neighbor).or_default().push(node);
                    queue.push_back((neighbor, d + 1));
                }
                Some(&nd) if nd == d + 1 => {
                    parents.entry(neighbor).or_default().push(node);
                }
                _ => {}
            }
        }
    }

    let Some(found_depth) = found_depth else {
        return result;
    };

    let reached: Vec<&str> = to_seeds
        .into_iter()
        .filter(|s| dist.get(s) == Some(&found_depth))
        .collect();

    let mut paths: Vec<Vec<String>> = Vec::new();
    for target in reached {
        if paths.len() >= max_paths {
            break;
        }
        let mut suffix: Vec<&str> = Vec::new();
        backtrack(target, &mut suffix, &from_seeds, &parents, max_paths, &mut paths);
    }

    let mut node_keys: HashSet<String> = HashSet::new();
    let mut consecutive: HashSet<(String, String)> = HashSet::new();
    for path in &paths {
        for key in path {
            node_keys.insert(key.clone());
        }
        for window in path.windows(2) {
            consecutive.insert((window[0].clone(), window[1].clone()));
        }
    }

    let nodes = node_keys
        .iter()
        .filter_map(|key| snapshot.nodes.get(key).map(|n| (key.clone(), n.clone())))
        .collect();
    let edges = snapshot
        .edges
        .iter()
        .filter(|e| consecutive.contains(&(e.from.clone(), e.to.clone())))
        .cloned()
        .collect();

    result.path_length = paths.first().map(|p| p.len().saturating_sub(1)).unwrap_or(0);
    result.paths = paths;
    result.nodes = nodes;
    result.edges = edges;
    result
}

fn backtrack<'a>(
    node: &'a str,
    suffix: &mut Vec<&'a str>,
    from_seeds: &HashSet<&'a str>,
    parents: &HashMap<&'a str, Vec<&'a str>>,
    max_paths: usize,
    out: &mut Vec<Vec<String>>,
) {
    if out.len() >= max_paths {
        return;
    }
    suffix.push(node);
    if from_seeds.contains(node) {
        let path: Vec<String> = suffix.iter().rev().map(|s| s.to_string()).collect();
        out.push(path);
    } else if let Some(ps) = parents.get(node) {
        for &parent in ps {
            if out.len() >= max_paths {
                break;
            }
            backtrack(parent, suffix, from_seeds, parents, max_paths, out);
        }
    }
    suffix.pop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildgraph_core::{EdgeType, Node as CoreNode};

    #[test]
    fn s4_shortest_paths_diamond() {
        let snap = Snapshot::new("c1", "main")
            .with_nodes([
                CoreNode::new("A", "go_library"),
                CoreNode::new("B", "go_library"),
                CoreNode::new("C", "go_library"),
                CoreNode::new("D", "go_library"),
            ])
            .with_edges([
                Edge::new("A", "B", EdgeType::Compile),
                Edge::new("A", "C", EdgeType::Compile),
                Edge::new("B", "D", EdgeType::Compile),
                Edge::new("C", "D", EdgeType::Compile),
            ]);

        let result = find_paths(&snap, "A", "D", 10);
        assert_eq!(result.paths.len(), 2);
        assert_eq!(result.path_length, 2);
        assert_eq!(result.nodes.len(), 4);
        assert_eq!(result.edges.len(), 4);
        let mut paths = result.paths.clone();
        paths.sort();
        assert_eq!(paths, vec![vec!["A", "B", "D"], vec!["A", "C", "D"]]);
    }

    #[test]
    fn no_path_returns_empty() {
        let snap = Snapshot::new("c1", "main").with_nodes([
            CoreNode::new("A", "go_library"),
            CoreNode::new("B", "go_library"),
        ]);
        let result = find_paths(&snap, "A", "B", 10);
        assert!(result.paths.is_empty());
        assert_eq!(result.path_length, 0);
    }

    #[test]
    fn respects_max_paths_cap() {
        // A fans out to 5 direct targets that are all "to" matches via shared package.
        let mut nodes = vec![CoreNode::new("A", "go_library")];
        let mut edges = Vec::new();
        for i in 0..5 {
            nodes.push(CoreNode::new(format!("pkg:t{i}"), "go_library"));
            edges.push(Edge::new("A", format!("pkg:t{i}"), EdgeType::Compile));
        }
        let snap = Snapshot::new("c1", "main").with_nodes(nodes).with_edges(edges);
        let result = find_paths(&snap, "A", "pkg", 3);
        assert_eq!(result.paths.len(), 3);
    }
}
