//! Pure graph operations over Snapshot/Edge — the leaf algorithms every
//! other crate in this workspace builds on.

use crate::model::{Edge, Snapshot};
use std::collections::{HashMap, HashSet};

/// Count of incoming edges per node key.
///
/// By default counts edge *occurrences* (a node with two incoming COMPILE
/// edges from different sources counts 2). Pass `dedup_by_to = true` to
/// instead count distinct source nodes once per target... no: dedup here
/// means collapsing parallel edges into the same `to` once, i.e. every
/// node present as a `to` at least once counts 1 regardless of fan-in.
pub fn in_degree(snapshot: &Snapshot, dedup_by_to: bool) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    if dedup_by_to {
        let mut seen: HashSet<&str> = HashSet::new();
        for edge in &snapshot.edges {
            seen.insert(edge.to.as_str());
        }
        for key in seen {
            counts.insert(key.to_string(), 1);
        }
    } else {
        for edge in &snapshot.edges {
            *counts.entry(edge.to.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Count of outgoing edges per node key. Symmetric to [`in_degree`].
pub fn out_degree(snapshot: &Snapshot, dedup_by_from: bool) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    if dedup_by_from {
        let mut seen: HashSet<&str> = HashSet::new();
        for edge in &snapshot.edges {
            seen.insert(edge.from.as_str());
        }
        for key in seen {
            counts.insert(key.to_string(), 1);
        }
    } else {
        for edge in &snapshot.edges {
            *counts.entry(edge.from.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Distinct non-empty packages over all nodes in the snapshot.
pub fn packages(snapshot: &Snapshot) -> HashSet<String> {
    snapshot
        .nodes
        .values()
        .map(|n| n.package().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Identity key for an edge: `"from|to|type"`.
pub fn edge_key(edge: &Edge) -> String {
    edge.edge_key()
}

/// Normalize a build label.
///
/// - strips a leading `@` immediately before `//` (`@//foo:bar` -> `//foo:bar`)
/// - collapses the `//pkg:pkg` shorthand to `//pkg` when the colon suffix
///   equals the basename of the path before the colon
/// - trims surrounding whitespace
///
/// Idempotent: `normalize_label(normalize_label(x)) == normalize_label(x)`.
pub fn normalize_label(label: &str) -> String {
    let mut s = label.trim().to_string();

    if let Some(rest) = s.strip_prefix('@') {
        if rest.starts_with("//") {
            s = rest.to_string();
        }
    }

    if let Some(idx) = s.rfind(':') {
        let path = &s[..idx];
        let suffix = &s[idx + 1..];
        let basename = path.rsplit('/').next().unwrap_or(path);
        if suffix == basename {
            s = path.to_string();
        }
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EdgeType, Node};

    fn snap() -> Snapshot {
        Snapshot::new("c1", "main").with_nodes([
            Node::new("//a:a", "go_library"),
            Node::new("//b:b", "go_library"),
            Node::new("//c:c", "go_library"),
        ])
    }

    #[test]
    fn degree_counts_occurrences_by_default() {
        let s = snap().with_edges([
            Edge::new("//a:a", "//b:b", EdgeType::Compile),
            Edge::new("//a:a", "//b:b", EdgeType::Runtime),
        ]);
        let indeg = in_degree(&s, false);
        assert_eq!(indeg.get("//b:b"), Some(&2));
        let outdeg = out_degree(&s, false);
        assert_eq!(outdeg.get("//a:a"), Some(&2));
    }

    #[test]
    fn degree_dedup_collapses_parallel_edges() {
        let s = snap().with_edges([
            Edge::new("//a:a", "//b:b", EdgeType::Compile),
            Edge::new("//a:a", "//b:b", EdgeType::Runtime),
        ]);
        let indeg = in_degree(&s, true);
        assert_eq!(indeg.get("//b:b"), Some(&1));
    }

    #[test]
    fn packages_distinct_non_empty() {
        let s = snap();
        let pkgs = packages(&s);
        assert_eq!(pkgs.len(), 3);
        assert!(pkgs.contains("//a"));
    }

    #[test]
    fn normalize_label_strips_leading_at() {
        assert_eq!(normalize_label("@//foo:bar"), "//foo:bar");
        assert_eq!(normalize_label("@com_github_foo//bar:baz"), "@com_github_foo//bar:baz");
    }

    #[test]
    fn normalize_label_collapses_shorthand() {
        assert_eq!(normalize_label("//path/to/pkg:pkg"), "//path/to/pkg");
        assert_eq!(normalize_label("//path/to/pkg:name"), "//path/to/pkg:name");
    }

    #[test]
    fn normalize_label_trims_whitespace() {
        assert_eq!(normalize_label("  //a:a  "), "//a:a");
    }

    #[test]
    fn normalize_label_idempotent() {
        for input in ["@//pkg:pkg", "  //a/b:b ", "//x:y", "@ext//a:a"] {
            let once = normalize_label(input);
            let twice = normalize_label(&once);
            assert_eq!(once, twice);
        }
    }
}
