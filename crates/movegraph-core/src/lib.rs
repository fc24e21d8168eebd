#![forbid(unsafe_code)]
//! movegraph-core library.
//!
//! Table model for the move dependency dataset, delimited-text I/O, pipeline
//! configuration, and the diagnostics document shared by every stage.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums for library failures, `anyhow::Result` at
//!   the stage boundary.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Absent values**: every cell is an `Option<String>`; empty strings,
//!   `NaN`, `None` and friends are normalized to `None` at ingestion.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod model;
pub mod table;

pub use model::{Move, MoveTable, RelationColumn, UNAVAILABLE_MEDIA, Video, VideoTable};
