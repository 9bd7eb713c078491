//! Tunable policy for the scoring engine.
//!
//! Every numeric default here matches spec prose exactly; weights are
//! tunable policy, not ground truth, so every metric gets its own
//! `...Config` struct with a `Default` impl and a `validate()`, following
//! the one-struct-per-concern convention used elsewhere in this workspace.

use crate::error::{Result, ScoringError};
use buildgraph_core::Grade;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossPackageConfig {
    pub intra_weight: f64,
    pub cross_weight: f64,
}

impl Default for CrossPackageConfig {
    fn default() -> Self {
        Self {
            intra_weight: 0.5,
            cross_weight: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FanoutConfig {
    pub min_threshold: u64,
    pub weight: f64,
    pub cap_per_node: f64,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            min_threshold: 10,
            weight: 0.5,
            cap_per_node: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentralityConfig {
    pub min_in_degree: u64,
    pub weight: f64,
    pub max_contribution: f64,
}

impl Default for CentralityConfig {
    fn default() -> Self {
        Self {
            min_in_degree: 50,
            weight: 0.7,
            max_contribution: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlastRadiusConfig {
    pub node_weight: f64,
    pub test_weight: f64,
    pub weight: f64,
    pub max_contribution: f64,
}

impl Default for BlastRadiusConfig {
    fn default() -> Self {
        Self {
            node_weight: 1.0,
            test_weight: 0.3,
            weight: 2.0,
            max_contribution: 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CreditsConfig {
    pub per_removed_cross_boundary: f64,
    pub max_credit_total: f64,
    pub per_reduction: f64,
    pub fanout_max_credit: f64,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            per_removed_cross_boundary: -0.5,
            max_credit_total: -15.0,
            per_reduction: -0.3,
            fanout_max_credit: -10.0,
        }
    }
}

/// Grade cutoffs; score ≤ `a_max` → A, ≤ `b_max` → B, and so on, else F.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeThresholds {
    pub a_max: f64,
    pub b_max: f64,
    pub c_max: f64,
    pub d_max: f64,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            a_max: 3.0,
            b_max: 7.0,
            c_max: 14.0,
            d_max: 24.0,
        }
    }
}

impl GradeThresholds {
    pub fn grade_for(&self, score: f64) -> Grade {
        if score <= self.a_max {
            Grade::A
        } else if score <= self.b_max {
            Grade::B
        } else if score <= self.c_max {
            Grade::C
        } else if score <= self.d_max {
            Grade::D
        } else {
            Grade::F
        }
    }
}

/// Aggregate policy surface for the scoring engine — one sub-config per metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoringConfig {
    pub cross_package: CrossPackageConfig,
    pub fanout: FanoutConfig,
    pub centrality: CentralityConfig,
    pub blast_radius: BlastRadiusConfig,
    pub credits: CreditsConfig,
    pub grade_thresholds: GradeThresholds,
}

impl ScoringConfig {
    /// Reject weight/threshold combinations that would make the engine
    /// behave nonsensically (e.g. caps below zero for a positive metric).
    pub fn validate(&self) -> Result<()> {
        if self.fanout.cap_per_node < 0.0 {
            return Err(ScoringError::InvalidConfig(
                "fanout.cap_per_node must be >= 0".into(),
            ));
        }
        if self.centrality.max_contribution < 0.0 {
            return Err(ScoringError::InvalidConfig(
                "centrality.max_contribution must be >= 0".into(),
            ));
        }
        if self.blast_radius.max_contribution < 0.0 {
            return Err(ScoringError::InvalidConfig(
                "blast_radius.max_contribution must be >= 0".into(),
            ));
        }
        let g = &self.grade_thresholds;
        if !(g.a_max < g.b_max && g.b_max < g.c_max && g.c_max < g.d_max) {
            return Err(ScoringError::InvalidConfig(
                "grade_thresholds must be strictly increasing".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn grade_thresholds_match_spec_defaults() {
        let g = GradeThresholds::default();
        assert_eq!(g.grade_for(3.0), Grade::A);
        assert_eq!(g.grade_for(7.0), Grade::B);
        assert_eq!(g.grade_for(14.0), Grade::C);
        assert_eq!(g.grade_for(24.0), Grade::D);
        assert_eq!(g.grade_for(24.1), Grade::F);
    }

    #[test]
    fn rejects_non_monotonic_thresholds() {
        let mut cfg = ScoringConfig::default();
        cfg.grade_thresholds.b_max = 1.0;
        assert!(cfg.validate().is_err());
    }
}
