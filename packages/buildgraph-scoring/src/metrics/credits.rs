//! M5 — Credits (`cleanup_credits`). An anti-reward: always non-positive.

use crate::config::CreditsConfig;
use crate::metric::Metric;
use crate::support::top_level_dir;
use buildgraph_core::{graph, Delta, EvidenceItem, MetricResult, Severity, Snapshot};
use std::collections::HashSet;

pub struct Credits {
    config: CreditsConfig,
}

impl Credits {
    pub fn new(config: CreditsConfig) -> Self {
        Self { config }
    }
}

impl Metric for Credits {
    fn key(&self) -> &str {
        "cleanup_credits"
    }

    fn name(&self) -> &str {
        "Cleanup credits"
    }

    fn evaluate(&self, delta: &Delta, base: &Snapshot, head: &Snapshot) -> MetricResult {
        let base_edge_keys: HashSet<String> = base.edges.iter().map(|e| e.edge_key()).collect();

        let mut edge_credit = 0.0_f64;
        let mut evidence = Vec::new();

        for edge in &delta.removed_edges {
            if !base_edge_keys.contains(&edge.edge_key()) {
                // Anti-gaming: the delta claims this edge was removed, but it
                // was never in base. Award nothing for it.
                continue;
            }
            let Some(src) = base.nodes.get(&edge.from) else {
                continue;
            };
            let Some(tgt) = base.nodes.get(&edge.to) else {
                continue;
            };
            if top_level_dir(src.package()) == top_level_dir(tgt.package()) {
                continue;
            }
            edge_credit += self.config.per_removed_cross_boundary;
            evidence.push(
                EvidenceItem::new("removed_cross_boundary_edge", format!("{} -> {} removed", edge.from, edge.to))
                    .with_from(edge.from.clone())
                    .with_to(edge.to.clone())
                    .with_value(self.config.per_removed_cross_boundary),
            );
        }
        edge_credit = edge_credit.max(self.config.max_credit_total);

        let base_out = graph::out_degree(base, false);
        let head_out = graph::out_degree(head, false);
        let mut fanout_credit = 0.0_f64;

        for node in base.nodes.values() {
            let prev = *base_out.get(&node.key).unwrap_or(&0);
            let cur = *head_out.get(&node.key).unwrap_or(&0);
            let reduction = prev as i64 - cur as i64;
            if reduction <= 0 {
                continue;
            }
            let credit = self.config.per_reduction * reduction as f64;
            fanout_credit += credit;
            evidence.push(
                EvidenceItem::new("fanout_reduction", format!("{} shed {reduction} dependencies", node.key))
                    .with_from(node.key.clone())
                    .with_value(reduction as f64),
            );
        }
        fanout_credit = fanout_credit.max(self.config.fanout_max_credit);

        let total = (edge_credit + fanout_credit)
            .max(self.config.max_credit_total + self.config.fanout_max_credit);

        MetricResult {
            key: self.key().to_string(),
            name: self.name().to_string(),
            contribution: total,
            severity: Severity::Info,
            evidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buildgraph_core::{compute_delta, Edge, EdgeType, Node};

    #[test]
    fn s3_anti_gaming_rejects_edge_absent_from_base() {
        let base = Snapshot::new("base", "main").with_nodes([Node::new("//x:x", "go_library"), Node::new("//y:y", "go_library")]);
        let head = base.clone();
        let mut delta = compute_delta(&base, &head);
        delta.removed_edges.push(Edge::new("//x:x", "//y:y", EdgeType::Compile));

        let metric = Credits::new(CreditsConfig::default());
        let result = metric.evaluate(&delta, &base, &head);
        assert_eq!(result.contribution, 0.0);
        assert!(result.evidence.is_empty());
    }

    #[test]
    fn s3_awards_credit_for_genuinely_removed_cross_boundary_edge() {
        let base = Snapshot::new("base", "main")
            .with_nodes([Node::new("//app/x:x", "go_library"), Node::new("//lib/y:y", "go_library")])
            .with_edges([Edge::new("//app/x:x", "//lib/y:y", EdgeType::Compile)]);
        let head = Snapshot::new("head", "main")
            .with_nodes([Node::new("//app/x:x", "go_library"), Node::new("//lib/y:y", "go_library")]);
        let delta = compute_delta(&base, &head);

        let metric = Credits::new(CreditsConfig::default());
        let result = metric.evaluate(&delta, &base, &head);
        assert_eq!(result.contribution, -0.5);
        assert_eq!(result.evidence.len(), 1);
    }

    #[test]
    fn severity_always_info() {
        let snap = Snapshot::new("c1", "main");
        let delta = compute_delta(&snap, &snap);
        let metric = Credits::new(CreditsConfig::default());
        let result = metric.evaluate(&delta, &snap, &snap);
        assert_eq!(result.severity, Severity::Info);
    }
}
