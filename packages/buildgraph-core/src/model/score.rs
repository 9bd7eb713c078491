//! ScoreResult and its constituent evidence types.

use super::delta::DeltaStats;
use serde::{Deserialize, Serialize};

/// Letter grade assigned to a score. Ordered A < B < C < D < F, matching
/// the derive order below (alphabetic, worsening).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    /// score ≤3 → A, ≤7 → B, ≤14 → C, ≤24 → D, else F.
    pub fn from_score(score: f64) -> Self {
        if score <= 3.0 {
            Grade::A
        } else if score <= 7.0 {
            Grade::B
        } else if score <= 14.0 {
            Grade::C
        } else if score <= 24.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    High,
    Medium,
    Low,
    Info,
}

/// One piece of evidence backing a metric's contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    #[serde(rename = "type")]
    pub evidence_type: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl EvidenceItem {
    pub fn new(evidence_type: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            evidence_type: evidence_type.into(),
            summary: summary.into(),
            from: None,
            to: None,
            value: None,
        }
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

/// The output of one Metric evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricResult {
    pub key: String,
    pub name: String,
    pub contribution: f64,
    pub severity: Severity,
    pub evidence: Vec<EvidenceItem>,
}

/// A node implicated by two or more metrics in the same score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub node_key: String,
    pub reason: String,
    pub score_contribution: f64,
    pub metric_keys: Vec<String>,
}

/// A suggested remediation, generated from a rule table keyed on metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub title: String,
    pub description: String,
    pub targets: Vec<String>,
    pub confidence: f64,
    pub addresses: Vec<String>,
}

/// Immutable once computed: the full grade + evidence breakdown for one delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total_score: f64,
    pub grade: Grade,
    pub breakdown: Vec<MetricResult>,
    pub hotspots: Vec<Hotspot>,
    pub suggested_actions: Vec<SuggestedAction>,
    pub delta_stats: DeltaStats,
    pub base_commit: String,
    pub head_commit: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_thresholds() {
        assert_eq!(Grade::from_score(0.0), Grade::A);
        assert_eq!(Grade::from_score(3.0), Grade::A);
        assert_eq!(Grade::from_score(3.1), Grade::B);
        assert_eq!(Grade::from_score(7.0), Grade::B);
        assert_eq!(Grade::from_score(14.0), Grade::C);
        assert_eq!(Grade::from_score(24.0), Grade::D);
        assert_eq!(Grade::from_score(24.1), Grade::F);
    }

    #[test]
    fn grade_monotonicity() {
        assert!(Grade::A < Grade::B);
        assert!(Grade::B < Grade::C);
        assert!(Grade::C < Grade::D);
        assert!(Grade::D < Grade::F);
    }
}
