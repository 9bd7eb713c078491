//! buildgraph-query: the graph query engine — package aggregation,
//! ego-graphs, shortest-path enumeration, degree-capped sampling and
//! subgraph extraction over an already-loaded Snapshot. None of these
//! mutate their input.

mod adjacency;
pub mod aggregate_packages;
pub mod cap_graph;
pub mod ego_graph;
pub mod extract_subgraph;
pub mod find_paths;
mod resolve;

pub use aggregate_packages::{aggregate_packages, AggregateResult, PackageEdge, PackageNode};
pub use cap_graph::cap_graph;
pub use ego_graph::{ego_graph, Direction, EgoResult};
pub use extract_subgraph::{extract_subgraph, SubgraphResult};
pub use find_paths::{find_paths, PathsResult};
