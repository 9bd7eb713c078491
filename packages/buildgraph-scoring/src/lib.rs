//! buildgraph-scoring: the weighted metric composition that turns a Delta
//! into a graded, evidence-backed ScoreResult.

pub mod config;
pub mod engine;
pub mod error;
pub mod metric;
pub mod metrics;
mod support;

pub use config::{
    BlastRadiusConfig, CentralityConfig, CreditsConfig, CrossPackageConfig, FanoutConfig,
    GradeThresholds, ScoringConfig,
};
pub use engine::ScoringEngine;
pub use error::{Result, ScoringError};
pub use metric::Metric;
pub use metrics::{BlastRadius, Centrality, Credits, CrossPackage, Fanout};
