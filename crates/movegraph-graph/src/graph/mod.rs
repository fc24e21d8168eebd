//! Move dependency graph.
//!
//! # Overview
//!
//! ```text
//! MoveTable
//!        ↓  parse::parse_edges()
//! ParsedEdges (row edges + unresolved/empty findings)
//!        ↓  build::MoveGraph::build()
//! MoveGraph (one node per row, deduplicated edges)
//!        ├─ build::MoveGraph::validate()  graph agrees with table
//!        ├─ export::adjacency_list()      JSON adjacency list
//!        ├─ stats::GraphStats::compute()  density, components, degree, spectrum
//!        └─ cycles::find_cycles()         directed mode only
//! ```
//!
//! Undirected mode (the default) stores one petgraph edge per unordered
//! pair and reads neighbors with `neighbors_undirected`. Directed mode keeps
//! `prereq -> move -> subseq` orientation.
//!
//! ## Cache Invalidation
//!
//! [`MoveGraph::content_hash`] is a BLAKE3 hash of the sorted edge list.

pub mod build;
pub mod cycles;
pub mod export;
pub mod stats;

pub use build::MoveGraph;
pub use cycles::find_cycles;
pub use export::{adjacency_list, edge_count_check, name_to_int, read_adjacency, relabel};
pub use stats::{GraphStats, adjacency_spectrum};
