//! Node — an addressable build target.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A build target, addressable by its canonical label.
///
/// `package` and the `is_test`/`is_external` classifications are derived
/// from `key`/`kind` rather than stored redundantly — see
/// [`Node::package`], [`Node::is_test`], [`Node::is_external`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Canonical label, globally unique within a snapshot (e.g. `//path/to/pkg:name`).
    pub key: String,
    /// Rule class string (e.g. `go_library`, `java_test`).
    pub kind: String,
    /// Set of arbitrary tags (may be empty).
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Set of visibility labels (may be empty).
    #[serde(default)]
    pub visibility: BTreeSet<String>,
}

impl Node {
    pub fn new(key: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: kind.into(),
            tags: BTreeSet::new(),
            visibility: BTreeSet::new(),
        }
    }

    pub fn with_tags(mut self, tags: BTreeSet<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_visibility(mut self, visibility: BTreeSet<String>) -> Self {
        self.visibility = visibility;
        self
    }

    /// Parent package label: strip everything after the last `:`, or the
    /// full label if there is no `:` suffix.
    pub fn package(&self) -> &str {
        match self.key.rfind(':') {
            Some(idx) => &self.key[..idx],
            None => &self.key,
        }
    }

    /// True iff `kind` ends in `_test`, `_tests`, or equals `test_suite`.
    pub fn is_test(&self) -> bool {
        self.kind.ends_with("_test") || self.kind.ends_with("_tests") || self.kind == "test_suite"
    }

    /// True iff the node belongs to a non-workspace repository: label
    /// starts with `@` but not `@//`.
    pub fn is_external(&self) -> bool {
        self.key.starts_with('@') && !self.key.starts_with("@//")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_strips_target_suffix() {
        let n = Node::new("//path/to/pkg:name", "go_library");
        assert_eq!(n.package(), "//path/to/pkg");
    }

    #[test]
    fn package_is_full_label_without_colon() {
        let n = Node::new("//path/to/pkg", "go_library");
        assert_eq!(n.package(), "//path/to/pkg");
    }

    #[test]
    fn is_test_classification() {
        assert!(Node::new("//x:y_test", "go_test").is_test());
        assert!(Node::new("//x:y", "py_tests").is_test());
        assert!(Node::new("//x:y", "test_suite").is_test());
        assert!(!Node::new("//x:y", "go_library").is_test());
    }

    #[test]
    fn is_external_classification() {
        assert!(Node::new("@com_github_foo//bar:baz", "go_library").is_external());
        assert!(!Node::new("@//bar:baz", "go_library").is_external());
        assert!(!Node::new("//bar:baz", "go_library").is_external());
    }
}
