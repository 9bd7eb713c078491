//! buildgraph-orchestration: the Ingestion Orchestrator (spec.md §4.5).
//!
//! Composes the `Extractor`/`RefResolver`/`TenantDirectory` capability
//! traits defined here with the `BlobStore`/`MetadataStore` capabilities
//! from `buildgraph-storage` and the `ScoringEngine` from
//! `buildgraph-scoring` into a single `process(request)` entry point that
//! always leaves its `Ingestion` row in a terminal state.

pub mod cache;
pub mod capability;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod orchestrator;
pub mod query_service;

pub use cache::SnapshotCache;
pub use capability::{
    ExtractionRequest, Extractor, InMemoryExtractor, InMemoryRefResolver, InMemoryTenantDirectory,
    RefResolver, ScopeMode, TenantDirectory,
};
pub use config::OrchestratorConfig;
pub use error::{ErrorCategory, OrchestratorError, Result};
pub use ingestion::{validate_transition, IngestionRequest, IngestionResponse};
pub use orchestrator::{Orchestrator, RescoreReport};
pub use query_service::QueryService;
