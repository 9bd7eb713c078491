//! M3 — Centrality (`centrality_penalty`).

use crate::config::CentralityConfig;
use crate::metric::Metric;
use buildgraph_core::{graph, Delta, EvidenceItem, MetricResult, Severity, Snapshot};
use std::collections::HashSet;

pub struct Centrality {
    config: CentralityConfig,
}

impl Centrality {
    pub fn new(config: CentralityConfig) -> Self {
        Self { config }
    }
}

impl Metric for Centrality {
    fn key(&self) -> &str {
        "centrality_penalty"
    }

    fn name(&self) -> &str {
        "Dependency on a central node"
    }

    fn evaluate(&self, delta: &Delta, base: &Snapshot, head: &Snapshot) -> MetricResult {
        if base.nodes.is_empty() {
            return MetricResult {
                key: self.key().to_string(),
                name: self.name().to_string(),
                contribution: 0.0,
                severity: Severity::Info,
                evidence: vec![EvidenceItem::new(
                    "cold_start",
                    "base snapshot has zero nodes; skipping centrality penalty",
                )],
            };
        }

        let base_in = graph::in_degree(base, false);
        let mut scored: HashSet<String> = HashSet::new();
        let mut sum = 0.0_f64;
        let mut evidence = Vec::new();

        for edge in &delta.added_edges {
            if scored.contains(&edge.to) {
                continue;
            }
            if let Some(src) = head.nodes.get(&edge.from) {
                if src.is_test() {
                    continue;
                }
            }
            let in_deg = *base_in.get(&edge.to).unwrap_or(&0);
            if (in_deg as u64) < self.config.min_in_degree {
                continue;
            }
            scored.insert(edge.to.clone());
            let contribution = self.config.weight * (1.0 + in_deg as f64).log2();
            sum += contribution;
            evidence.push(
                EvidenceItem::new("new_edge_to_central_node", format!("new dependency on {}", edge.to))
                    .with_to(edge.to.clone())
                    .with_value(in_deg as f64),
            );
        }

        sum = sum.min(self.config.max_contribution);

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
    fn s2_cold_start_centrality() {
        let base = Snapshot::new("base", "main");
        let head = Snapshot::new("head", "main")
            .with_nodes([Node::new("//x:a", "go_library"), Node::new("//x:b", "go_library")])
            .with_edges([Edge::new("//x:a", "//x:b", EdgeType::Compile)]);
        let delta = compute_delta(&base, &head);

        let metric = Centrality::new(CentralityConfig::default());
        let result = metric.evaluate(&delta, &base, &head);
        assert_eq!(result.contribution, 0.0);
        assert_eq!(result.severity, Severity::Info);
        assert_eq!(result.evidence.len(), 1);
    }

    #[test]
    fn skips_targets_below_min_in_degree() {
        let base = Snapshot::new("base", "main").with_nodes([Node::new("//x:a", "go_library"), Node::new("//x:hub", "go_library")]);
        let head = base.clone().with_edges([Edge::new("//x:a", "//x:hub", EdgeType::Compile)]);
        let delta = compute_delta(&base, &head);
        let metric = Centrality::new(CentralityConfig::default());
        let result = metric.evaluate(&delta, &base, &head);
        assert_eq!(result.contribution, 0.0);
    }

    #[test]
    fn scores_new_dependency_on_highly_depended_node() {
        let mut nodes: Vec<Node> = (0..60).map(|i| Node::new(format!("//x:dep{i}"), "go_library")).collect();
        nodes.push(Node::new("//x:hub", "go_library"));
        nodes.push(Node::new("//x:caller", "go_library"));
        let base = Snapshot::new("base", "main").with_nodes(nodes.clone()).with_edges(
            (0..60).map(|i| Edge::new(format!("//x:dep{i}"), "//x:hub", EdgeType::Compile)),
        );
        let head = base.clone().with_edges(
            (0..60).map(|i| Edge::new(format!("//x:dep{i}"), "//x:hub", EdgeType::Compile))
                .chain([Edge::new("//x:caller", "//x:hub", EdgeType::Compile)]),
        );
        let delta = compute_delta(&base, &head);
        let metric = Centrality::new(CentralityConfig::default());
        let result = metric.evaluate(&delta, &base, &head);
        assert!(result.contribution > 0.0);
        assert_eq!(result.evidence.len(), 1);
    }
}
