//! buildgraph-storage: the `BlobStore`/`MetadataStore` capability contracts
//! (spec.md §6) plus the one real adapter that implements both over SQLite,
//! and in-memory fakes for tests.
//!
//! Blobs (`Snapshot`/`Delta` JSON payloads) and metadata rows (repositories,
//! ingestions, snapshots, deltas, scores, baselines) are kept behind two
//! separate traits even though [`infrastructure::sqlite::SqliteStore`]
//! implements both over one connection — callers that only need one
//! capability (e.g. a read-only query service) can depend on just that
//! trait.

pub mod domain;
pub mod error;

#[cfg(feature = "sqlite")]
pub mod infrastructure;

pub use domain::{
    BaselineRow, BlobKind, BlobStore, DeltaRow, InMemoryBlobStore, InMemoryMetadataStore,
    IngestionRow, IngestionState, MetadataStore, RepositoryRow, ScoreRow, SnapshotRow,
};
pub use error::{ErrorKind, Result, StorageError};

#[cfg(feature = "sqlite")]
pub use infrastructure::sqlite::SqliteStore;
