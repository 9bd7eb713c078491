//! M2 — Fanout (`fanout_increase`).

use crate::config::FanoutConfig;
use crate::metric::Metric;
use buildgraph_core::{graph, Delta, EvidenceItem, MetricResult, Severity, Snapshot};

pub struct Fanout {
    config: FanoutConfig,
}

impl Fanout {
    pub fn new(config: FanoutConfig) -> Self {
        Self { config }
    }
}

impl Metric for Fanout {
    fn key(&self) -> &str {
        "fanout_increase"
    }

    fn name(&self) -> &str {
        "Fan-out increase"
    }

    fn evaluate(&self, _delta: &Delta, base: &Snapshot, head: &Snapshot) -> MetricResult {
        let base_out = graph::out_degree(base, false);
        let head_out = graph::out_degree(head, false);

        let mut sum = 0.0_f64;
        let mut evidence = Vec::new();

        for node in head.nodes.values() {
            if node.is_test() || node.is_external() {
                continue;
            }
            let cur = *head_out.get(&node.key).unwrap_or(&0);
            if cur as u64 <= self.config.min_threshold {
                continue;
            }
            let prev = *base_out.get(&node.key).unwrap_or(&0);
            let grown = cur as i64 - prev as i64;
            if grown <= 0 {
                continue;
            }
            let contribution =
                self.config.weight * (grown as f64).min(self.config.cap_per_node);
            sum += contribution;
            evidence.push(
                EvidenceItem::new("fanout_growth", format!("{} grew by {grown}", node.key))
                    .with_from(node.key.clone())
                    .with_value(grown as f64),
            );
        }

        let severity = if sum > 5.0 {
            Severity::High
        } else if sum > 0.0 {
            Severity::Medium
        } else {
            Severity::Low
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
    fn scores_nodes_whose_fanout_grew_past_threshold() {
        let mut base = Snapshot::new("base", "main").with_nodes(
            (0..12).map(|i| Node::new(format!("//x:t{i}"), "go_library")).chain([Node::new("//x:hub", "go_library")]),
        );
        base = base.with_edges((0..2).map(|i| Edge::new("//x:hub", format!("//x:t{i}"), EdgeType::Compile)));

        let head = base.clone().with_edges((0..12).map(|i| Edge::new("//x:hub", format!("//x:t{i}"), EdgeType::Compile)));
        let delta = compute_delta(&base, &head);

        let metric = Fanout::new(FanoutConfig::default());
        let result = metric.evaluate(&delta, &base, &head);
        // head out-degree(hub) = 12 > 10, delta = 12 - 2 = 10, capped at 10 -> 0.5*10 = 5.0
        assert_eq!(result.contribution, 5.0);
        assert_eq!(result.evidence.len(), 1);
    }

    #[test]
    fn ignores_nodes_below_threshold() {
        let base = Snapshot::new("base", "main").with_nodes([Node::new("//x:a", "go_library"), Node::new("//x:b", "go_library")]);
        let head = base.clone().with_edges([Edge::new("//x:a", "//x:b", EdgeType::Compile)]);
        let delta = compute_delta(&base, &head);
        let metric = Fanout::new(FanoutConfig::default());
        let result = metric.evaluate(&delta, &base, &head);
        assert_eq!(result.contribution, 0.0);
    }
}
