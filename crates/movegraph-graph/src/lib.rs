#![forbid(unsafe_code)]
//! movegraph-graph library.
//!
//! Builds the move dependency graph from a [`movegraph_core::MoveTable`],
//! checks the table for structural defects, repairs what can be repaired,
//! and derives datasets (masks, relabeled adjacency lists, label and
//! bag-of-words features) from the result.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums ([`GraphError`], [`SplitError`]) for
//!   contract violations; data-quality findings are plain values.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Node identity**: node index `i` is table row `i`; its weight is the
//!   move name, or `#<row>` (1-based) for a row with no name.

pub mod check;
pub mod error;
pub mod features;
pub mod graph;
pub mod labels;
pub mod masks;
pub mod parse;
pub mod repair;

pub use error::{GraphError, SplitError};
pub use graph::MoveGraph;
pub use masks::Masks;
