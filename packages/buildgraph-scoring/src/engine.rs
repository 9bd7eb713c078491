//! `ScoringEngine` — the reducer over a sequence of [`Metric`] values.

use crate::config::ScoringConfig;
use crate::error::{Result, ScoringError};
use crate::metric::Metric;
use crate::metrics::{BlastRadius, Centrality, Credits, CrossPackage, Fanout};
use buildgraph_core::{Delta, Hotspot, ScoreResult, Snapshot, SuggestedAction};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Composes the five metrics in spec order and reduces their output into a
/// single [`ScoreResult`].
pub struct ScoringEngine {
    metrics: Vec<Box<dyn Metric + Send + Sync>>,
    config: ScoringConfig,
}

impl ScoringEngine {
    /// Construct an engine with the five built-in metrics, in the fixed
    /// order the breakdown preserves.
    pub fn with_default_metrics(config: ScoringConfig) -> Self {
        let metrics: Vec<Box<dyn Metric + Send + Sync>> = vec![
            Box::new(CrossPackage::new(config.cross_package)),
            Box::new(Fanout::new(config.fanout)),
            Box::new(Centrality::new(config.centrality)),
            Box::new(BlastRadius::new(config.blast_radius)),
            Box::new(Credits::new(config.credits)),
        ];
        Self { metrics, config }
    }

    /// Construct an engine over a caller-supplied metric sequence. The
    /// engine calls metrics in the order given; `breakdown` preserves it.
    pub fn new(metrics: Vec<Box<dyn Metric + Send + Sync>>, config: ScoringConfig) -> Result<Self> {
        if metrics.is_empty() {
            return Err(ScoringError::InvalidInput(
                "scoring engine requires at least one metric".into(),
            ));
        }
        Ok(Self { metrics, config })
    }

    pub fn score(&self, delta: &Delta, base: &Snapshot, head: &Snapshot) -> ScoreResult {
        let mut breakdown = Vec::with_capacity(self.metrics.len());
        let mut total_score = 0.0_f64;

        for metric in &self.metrics {
            let result = metric.evaluate(delta, base, head);
            debug!(metric = metric.key(), contribution = result.contribution, "evaluated metric");
            if result.contribution != 0.0 && result.evidence.is_empty() {
                warn!(metric = metric.key(), "non-zero contribution with no evidence");
            }
            total_score += result.contribution;
            breakdown.push(result);
        }

        total_score = total_score.max(0.0);
        let grade = self.config.grade_thresholds.grade_for(total_score);
        let hotspots = compute_hotspots(&breakdown);
        let suggested_actions = suggest_actions(&breakdown);

        ScoreResult {
            total_score,
            grade,
            breakdown,
            hotspots,
            suggested_actions,
            delta_stats: delta.stats.clone(),
            base_commit: base.commit_sha.clone(),
            head_commit: head.commit_sha.clone(),
        }
    }
}

/// A node implicated by ≥2 distinct metric keys becomes a hotspot.
/// Each non-negative-contribution metric's evidence items attribute
/// `contribution / |evidence|` to both their `from` and `to` nodes.
fn compute_hotspots(breakdown: &[buildgraph_core::MetricResult]) -> Vec<Hotspot> {
    let mut acc: HashMap<String, (f64, Vec<String>)> = HashMap::new();

    for metric in breakdown {
        if metric.contribution < 0.0 || metric.evidence.is_empty() {
            continue;
        }
        let share = metric.contribution / metric.evidence.len() as f64;
        for item in &metric.evidence {
            for key in [item.from.as_ref(), item.to.as_ref()].into_iter().flatten() {
                let entry = acc.entry(key.clone()).or_insert_with(|| (0.0, Vec::new()));
                entry.0 += share;
                if !entry.1.contains(&metric.key) {
                    entry.1.push(metric.key.clone());
                }
            }
        }
    }

    let mut hotspots: Vec<Hotspot> = acc
        .into_iter()
        .filter(|(_, (_, keys))| keys.len() >= 2)
        .map(|(node_key, (contribution, metric_keys))| Hotspot {
            node_key,
            reason: format!("flagged by {} metrics", metric_keys.len()),
            score_contribution: contribution,
            metric_keys,
        })
        .collect();

    hotspots.sort_by(|a, b| b.score_contribution.partial_cmp(&a.score_contribution).unwrap());
    hotspots.truncate(10);
    hotspots
}

fn suggest_actions(breakdown: &[buildgraph_core::MetricResult]) -> Vec<SuggestedAction> {
    let mut actions = Vec::new();

    for metric in breakdown {
        match metric.key.as_str() {
            "fanout_increase" => {
                for item in &metric.evidence {
                    if item.value.unwrap_or(0.0) >= 20.0 {
                        if let Some(from) = &item.from {
                            actions.push(SuggestedAction {
                                title: format!("Consider splitting {from}"),
                                description: format!(
                                    "{from} grew its fan-out by {} in this change",
                                    item.value.unwrap_or(0.0)
                                ),
                                targets: vec![from.clone()],
                                confidence: 0.7,
                                addresses: vec![metric.key.clone()],
                            });
                        }
                    }
                }
            }
            "cross_package_deps" => {
                let mut by_from: HashMap<String, usize> = HashMap::new();
                for item in &metric.evidence {
                    if let Some(from) = &item.from {
                        *by_from.entry(from.clone()).or_insert(0) += 1;
                    }
                }
                for (from, count) in by_from {
                    if count >= 3 {
                        actions.push(SuggestedAction {
                            title: format!("Extract shared dependency for {from}"),
                            description: format!(
                                "{from} added {count} outgoing cross-package dependencies in this change"
                            ),
                            targets: vec![from.clone()],
                            confidence: 0.5,
                            addresses: vec![metric.key.clone()],
                        });
                    }
                }
            }
            "centrality_penalty" => {
                for item in &metric.evidence {
                    if item.value.unwrap_or(0.0) >= 100.0 {
                        if let Some(to) = &item.to {
                            actions.push(SuggestedAction {
                                title: format!("Avoid direct dependency on {to}"),
                                description: format!(
                                    "{to} already has {} incoming dependencies in base",
                                    item.value.unwrap_or(0.0)
                                ),
                                targets: vec![to.clone()],
                                confidence: 0.5,
                                addresses: vec![metric.key.clone()],
                            });
                        }
                    }
                }
            }
            _ => {}
        }
    }

    actions.truncate(5);
    actions
}
