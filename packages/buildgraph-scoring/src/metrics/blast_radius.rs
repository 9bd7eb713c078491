//! M4 — BlastRadius (`blast_radius`).

use crate::config::BlastRadiusConfig;
use crate::metric::Metric;
use buildgraph_core::{graph, Delta, EvidenceItem, MetricResult, Severity, Snapshot};
use std::collections::HashSet;

pub struct BlastRadius {
    config: BlastRadiusConfig,
}

impl BlastRadius {
    pub fn new(config: BlastRadiusConfig) -> Self {
        Self { config }
    }
}

impl Metric for BlastRadius {
    fn key(&self) -> &str {
        "blast_radius"
    }

    fn name(&self) -> &str {
        "Blast radius of the change"
    }

    fn evaluate(&self, delta: &Delta, base: &Snapshot, head: &Snapshot) -> MetricResult {
        let mut affected: HashSet<String> = HashSet::new();
        for edge in delta.added_edges.iter().chain(&delta.removed_edges) {
            affected.insert(edge.from.clone());
            affected.insert(edge.to.clone());
        }
        for node in delta.added_nodes.iter().chain(&delta.removed_nodes) {
            affected.insert(node.key.clone());
        }

        if affected.is_empty() {
            return MetricResult {
                key: self.key().to_string(),
                name: self.name().to_string(),
                contribution: 0.0,
                severity: Severity::Info,
                evidence: vec![EvidenceItem::new(
                    "no_change",
                    "delta touched no nodes; blast radius is zero",
                )],
            };
        }

        let base_in = graph::in_degree(base, false);
        let mut radius = 0.0_f64;
        let mut by_raw_degree: Vec<(String, u64)> = Vec::new();

        for node_key in &affected {
            let in_deg = *base_in.get(node_key).unwrap_or(&0) as u64;
            let is_test = head
                .nodes
                .get(node_key)
                .or_else(|| base.nodes.get(node_key))
                .map(|n| n.is_test())
                .unwrap_or(false);
            let weight = if is_test {
                self.config.test_weight
            } else {
                self.config.node_weight
            };
            radius += weight * in_deg as f64;
            by_raw_degree.push((node_key.clone(), in_deg));
        }

        by_raw_degree.sort_by(|a, b| b.1.cmp(&a.1));
        let evidence = by_raw_degree
            .into_iter()
            .take(3)
            .map(|(key, in_deg)| {
                EvidenceItem::new("affected_node", format!("{key} has in-degree {in_deg} in base"))
                    .with_from(key)
                    .with_value(in_deg as f64)
            })
            .collect();

        let contribution = (self.config.weight * (1.0 + radius).log2())
            .min(self.config.max_contribution);

        let severity = if contribution > 5.0 {
            Severity::High
        } else if contribution > 0.0 {
            Severity::Medium
        } else {
            Severity::Info
        };

        MetricResult {
            key: self.key().to_string(),
            name: self.name().to_string(),
            contribution,
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
    fn empty_delta_yields_zero_radius() {
        let snap = Snapshot::new("c1", "main").with_nodes([Node::new("//x:a", "go_library")]);
        let delta = compute_delta(&snap, &snap);
        let metric = BlastRadius::new(BlastRadiusConfig::default());
        let result = metric.evaluate(&delta, &snap, &snap);
        assert_eq!(result.contribution, 0.0);
        assert_eq!(result.severity, Severity::Info);
    }

    #[test]
    fn weighs_test_nodes_lower() {
        let base = Snapshot::new("base", "main").with_nodes([
            Node::new("//x:a", "go_library"),
            Node::new("//x:b_test", "go_test"),
        ]);
        let head = base.clone().with_edges([Edge::new("//x:a", "//x:b_test", EdgeType::Compile)]);
        let delta = compute_delta(&base, &head);
        let metric = BlastRadius::new(BlastRadiusConfig::default());
        let result = metric.evaluate(&delta, &base, &head);
        assert!(result.contribution >= 0.0);
        assert!(!result.evidence.is_empty());
    }
}
