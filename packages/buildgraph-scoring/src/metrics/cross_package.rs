//! M1 — CrossPackage (`cross_package_deps`).

use crate::config::CrossPackageConfig;
use crate::metric::Metric;
use crate::support::{is_proto_kind, top_level_dir};
use buildgraph_core::{Delta, EvidenceItem, MetricResult, Severity, Snapshot};

pub struct CrossPackage {
    config: CrossPackageConfig,
}

impl CrossPackage {
    pub fn new(config: CrossPackageConfig) -> Self {
        Self { config }
    }
}

impl Metric for CrossPackage {
    fn key(&self) -> &str {
        "cross_package_deps"
    }

    fn name(&self) -> &str {
        "Cross-package dependency growth"
    }

    fn evaluate(&self, delta: &Delta, _base: &Snapshot, head: &Snapshot) -> MetricResult {
        let mut sum = 0.0_f64;
        let mut evidence = Vec::new();

        for edge in &delta.added_edges {
            let Some(src) = head.nodes.get(&edge.from) else {
                continue;
            };
            let Some(tgt) = head.nodes.get(&edge.to) else {
                continue;
            };
            if tgt.is_test() || tgt.is_external() || is_proto_kind(&tgt.kind) {
                continue;
            }
            if src.package() == tgt.package() {
                continue;
            }
            let weight = if top_level_dir(src.package()) == top_level_dir(tgt.package()) {
                self.config.intra_weight
            } else {
                self.config.cross_weight
            };
            sum += weight;
            evidence.push(
                EvidenceItem::new("added_edge", format!("{} -> {}", edge.from, edge.to))
                    .with_from(edge.from.clone())
                    .with_to(edge.to.clone())
                    .with_value(weight),
            );
        }

        let severity = if sum > 5.0 {
            Severity::High
        } else if sum > 0.0 {
            Severity::Medium
        } else {
            Severity::Info
        };

        MetricResult {
            key: self.key().to_string(),
            name: self.name().to_string(),
            contribution: sum,
            severity,
            evidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildgraph_core::{compute_delta, Edge, EdgeType, Node};

    #[test]
    fn s1_cross_boundary_regression() {
        let base = Snapshot::new("base", "main")
            .with_nodes([Node::new("//app/a:lib", "go_library"), Node::new("//lib/b:lib", "go_library")]);
        let head = base.clone().with_edges([Edge::new("//app/a:lib", "//lib/b:lib", EdgeType::Compile)]);
        let delta = compute_delta(&base, &head);

        let metric = CrossPackage::new(CrossPackageConfig::default());
        let result = metric.evaluate(&delta, &base, &head);

        assert_eq!(result.contribution, 1.5);
        assert_eq!(result.evidence.len(), 1);
        assert_eq!(result.evidence[0].from.as_deref(), Some("//app/a:lib"));
    }

    #[test]
    fn intra_boundary_edge_weighted_lower() {
        let base = Snapshot::new("base", "main")
            .with_nodes([Node::new("//app/a:lib", "go_library"), Node::new("//app/b:lib", "go_library")]);
        let head = base.clone().with_edges([Edge::new("//app/a:lib", "//app/b:lib", EdgeType::Compile)]);
        let delta = compute_delta(&base, &head);

        let metric = CrossPackage::new(CrossPackageConfig::default());
        let result = metric.evaluate(&delta, &base, &head);
        assert_eq!(result.contribution, 0.5);
    }

    #[test]
    fn skips_test_and_external_and_proto_targets() {
        let base = Snapshot::new("base", "main").with_nodes([Node::new("//app/a:lib", "go_library")]);
        let head = base.clone().with_nodes([
            Node::new("//app/a:lib", "go_library"),
            Node::new("//lib/b:b_test", "go_test"),
            Node::new("@com_github_foo//bar:baz", "go_library"),
            Node::new("//lib/c:c_proto", "proto_library"),
        ]).with_edges([
            Edge::new("//app/a:lib", "//lib/b:b_test", EdgeType::Compile),
            Edge::new("//app/a:lib", "@com_github_foo//bar:baz", EdgeType::Compile),
            Edge::new("//app/a:lib", "//lib/c:c_proto", EdgeType::Compile),
        ]);
        let delta = compute_delta(&base, &head);
        let metric = CrossPackage::new(CrossPackageConfig::default());
        let result = metric.evaluate(&delta, &base, &head);
        assert_eq!(result.contribution, 0.0);
        assert!(result.evidence.is_empty());
    }
}
