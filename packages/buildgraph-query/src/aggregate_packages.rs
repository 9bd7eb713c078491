//! `AggregatePackages(hide_tests, hide_external, min_edge_weight, max_pkgs)`
//! — projects a target-level graph onto its package-level skeleton.

use buildgraph_core::Snapshot;
use std::collections::{BTreeSet, HashMap, HashSet};

pub const DEFAULT_MIN_EDGE_WEIGHT: usize = 1;
pub const DEFAULT_MAX_PKGS: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct PackageNode {
    pub package: String,
    pub target_count: usize,
    pub kinds: BTreeSet<String>,
    pub has_tests: bool,
    pub is_external: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackageEdge {
    pub from: String,
    pub to: String,
    pub weight: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AggregateResult {
    pub packages: HashMap<String, PackageNode>,
    pub edges: Vec<PackageEdge>,
    pub truncated: bool,
}

pub fn aggregate_packages(
    snapshot: &Snapshot,
    hide_tests: bool,
    hide_external: bool,
    min_edge_weight: usize,
    max_pkgs: usize,
) -> AggregateResult {
    let packages_before: HashSet<String> = snapshot
        .nodes
        .values()
        .map(|n| n.package().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    let kept_nodes: Vec<_> = snapshot
        .nodes
        .values()
        .filter(|n| {
            !n.package().is_empty()
                && !(hide_tests && n.is_test())
                && !(hide_external && n.is_external())
        })
        .collect();
    let included: HashSet<&str> = kept_nodes.iter().map(|n| n.key.as_str()).collect();

    let mut packages: HashMap<String, PackageNode> = HashMap::new();
    for node in &kept_nodes {
        let pkg = node.package().to_string();
        let entry = packages.entry(pkg.clone()).or_insert_with(|| PackageNode {
            package: pkg,
            target_count: 0,
            kinds: BTreeSet::new(),
            has_tests: false,
            is_external: node.is_external(),
        });
        entry.target_count += 1;
        entry.kinds.insert(node.kind.clone());
        if node.is_test() {
            entry.has_tests = true;
        }
    }

    let packages_after: HashSet<&String> = packages.keys().collect();
    let dropped_by_filter = packages_before.iter().any(|p| !packages_after.contains(p));

    let mut pair_counts: HashMap<(String, String), usize> = HashMap::new();
    for edge in &snapshot.edges {
        if !included.contains(edge.from.as_str()) || !included.contains(edge.to.as_str()) {
            continue;
        }
        let Some(src) = snapshot.nodes.get(&edge.from) else {
            continue;
        };
        let Some(tgt) = snapshot.nodes.get(&edge.to) else {
            continue;
        };
        let (sp, tp) = (src.package().to_string(), tgt.package().to_string());
        if sp == tp || sp.is_empty() || tp.is_empty() {
            continue;
        }
        *pair_counts.entry((sp, tp)).or_insert(0) += 1;
    }

    let mut edges: Vec<PackageEdge> = pair_counts
        .into_iter()
        .filter(|(_, weight)| *weight >= min_edge_weight)
        .map(|((from, to), weight)| PackageEdge { from, to, weight })
        .collect();

    let mut truncated = dropped_by_filter;

    if packages.len() > max_pkgs {
        let mut degree: HashMap<String, usize> = HashMap::new();
        for edge in &edges {
            *degree.entry(edge.from.clone()).or_insert(0) += edge.weight;
            *degree.entry(edge.to.clone()).or_insert(0) += edge.weight;
        }
        let mut ranked: Vec<(String, usize)> = packages
            .keys()
            .map(|p| (p.clone(), *degree.get(p).unwrap_or(&0)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(max_pkgs);
        let surviving: HashSet<String> = ranked.into_iter().map(|(p, _)| p).collect();

        packages.retain(|k, _| surviving.contains(k));
        edges.retain(|e| surviving.contains(&e.from) && surviving.contains(&e.to));
        truncated = true;
    }

    AggregateResult { packages, edges, truncated }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildgraph_core::{Edge, EdgeType, Node};

    #[test]
    fn s6_package_aggregation() {
        let base = Snapshot::new("c1", "main").with_nodes([
            Node::new("//a:t0", "go_library"),
            Node::new("//a:t1", "go_library"),
            Node::new("//b:t0", "go_library"),
        ]);
        let snap = base.with_edges([
            Edge::new("//a:t0", "//b:t0", EdgeType::Compile),
            Edge::new("//a:t0", "//b:t0", EdgeType::Runtime),
            Edge::new("//a:t1", "//b:t0", EdgeType::Compile),
            Edge::new("//a:t1", "//b:t0", EdgeType::Data),
            Edge::new("//a:t0", "//b:t0", EdgeType::Data),
        ]);

        let result = aggregate_packages(&snap, false, false, 5, 500);
        assert_eq!(result.packages.len(), 2);
        assert_eq!(result.edges.len(), 1);
        assert_eq!(result.edges[0].weight, 5);
        assert!(!result.truncated);

        let result_high = aggregate_packages(&snap, false, false, 6, 500);
        assert!(result_high.edges.is_empty());
    }

    #[test]
    fn hiding_tests_can_drop_a_whole_package() {
        let snap = Snapshot::new("c1", "main").with_nodes([
            Node::new("//a:t0", "go_library"),
            Node::new("//t:only_test", "go_test"),
        ]);
        let result = aggregate_packages(&snap, true, false, 1, 500);
        assert!(!result.packages.contains_key("//t"));
        assert!(result.truncated);
    }
}
