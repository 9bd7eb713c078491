//! Seed-resolution rules shared by more than one query.

use buildgraph_core::Snapshot;
use std::collections::HashSet;

/// `ExtractSubgraph`'s root-matching rule: exact key equality OR the root
/// is a string prefix of the key.
pub fn match_roots<'a>(snapshot: &'a Snapshot, roots: &[String]) -> HashSet<&'a str> {
    let mut matched = HashSet::new();
    for key in snapshot.nodes.keys() {
        for root in roots {
            if key == root || key.starts_with(root.as_str()) {
                matched.insert(key.as_str());
                break;
            }
        }
    }
    matched
}

/// `EgoGraph`/`FindPaths`' richer target-resolution rule: exact key match,
/// or `key` prefixed by `target + ":"` or `target + "/"`, or any node whose
/// `package() == target`.
pub fn resolve_target<'a>(snapshot: &'a Snapshot, target: &str) -> HashSet<&'a str> {
    let colon_prefix = format!("{target}:");
    let slash_prefix = format!("{target}/");
    let mut matched = HashSet::new();
    for (key, node) in &snapshot.nodes {
        if key == target
            || key.starts_with(&colon_prefix)
            || key.starts_with(&slash_prefix)
            || node.package() == target
        {
            matched.insert(key.as_str());
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildgraph_core::Node;

    fn snap() -> Snapshot {
        Snapshot::new("c1", "main").with_nodes([
            Node::new("//a/b:lib", "go_library"),
            Node::new("//a/b:lib_test", "go_test"),
            Node::new("//a/c:lib", "go_library"),
        ])
    }

    #[test]
    fn match_roots_exact_and_prefix() {
        let s = snap();
        let matched = match_roots(&s, &["//a/b:lib".to_string()]);
        assert_eq!(matched.len(), 1);
        let matched = match_roots(&s, &["//a/b".to_string()]);
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn resolve_target_by_package() {
        let s = snap();
        let matched = resolve_target(&s, "//a/b");
        assert_eq!(matched.len(), 2);
        assert!(matched.contains("//a/b:lib"));
        assert!(matched.contains("//a/b:lib_test"));
    }

    #[test]
    fn resolve_target_no_match_is_empty() {
        let s = snap();
        assert!(resolve_target(&s, "//missing").is_empty());
    }
}
