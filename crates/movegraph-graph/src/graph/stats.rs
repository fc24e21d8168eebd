//! Basic graph statistics for the move graph.
//!
//! # Statistics Provided
//!
//! - **node_count** / **edge_count**: as stored (undirected pairs once).
//! - **density**: `2E / (N(N-1))` undirected, `E / (N(N-1))` directed; zero
//!   for fewer than two nodes.
//! - **component_count**: weakly connected components.
//! - **largest_component_size**: node count of the biggest component.
//! - **isolated_node_count**: nodes with no incident edge.
//! - **average_degree** / **max_degree**: over incident edges, ignoring
//!   direction.
//! - **cycle_count**: prerequisite cycles; always zero in undirected mode.
//! - **eigenvalues**: spectrum of the 0/1 adjacency matrix, read undirected
//!   so it is symmetric and the spectrum is real. Sorted descending; the
//!   first entry is the spectral radius.

use nalgebra::{DMatrix, SymmetricEigen};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::graph::MoveGraph;
use crate::graph::cycles::find_cycles;

// ---------------------------------------------------------------------------
// GraphStats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub component_count: usize,
    pub largest_component_size: usize,
    pub isolated_node_count: usize,
    pub average_degree: f64,
    pub max_degree: usize,
    /// Label of the first node reaching `max_degree`.
    pub max_degree_node: Option<String>,
    pub cycle_count: usize,
    pub eigenvalues: Vec<f64>,
    pub content_hash: String,
}

impl GraphStats {
    #[must_use]
    pub fn compute(graph: &MoveGraph) -> Self {
        let node_count = graph.node_count();
        let edge_count = graph.edge_count();
        let components = graph.components();

        let degrees: Vec<usize> = graph
            .graph
            .node_indices()
            .map(|idx| graph.degree(idx))
            .collect();

        let (max_pos, max_degree) = degrees
            .iter()
            .copied()
            .enumerate()
            .fold((None, 0), |(best, max), (pos, d)| {
                if best.is_none() || d > max {
                    (Some(pos), d)
                } else {
                    (best, max)
                }
            });

        Self {
            node_count,
            edge_count,
            density: compute_density(node_count, edge_count, graph.directed),
            component_count: components.len(),
            largest_component_size: components.iter().map(Vec::len).max().unwrap_or(0),
            isolated_node_count: degrees.iter().filter(|d| **d == 0).count(),
            average_degree: mean(degrees.iter().sum(), node_count),
            max_degree,
            max_degree_node: max_pos
                .and_then(|pos| graph.label(NodeIndex::new(pos)))
                .map(str::to_string),
            cycle_count: find_cycles(graph).len(),
            eigenvalues: adjacency_spectrum(graph),
            content_hash: graph.content_hash.clone(),
        }
    }
}

/// Eigenvalues of the undirected adjacency matrix, largest first.
///
/// An arc in either direction sets both `m[a][b]` and `m[b][a]` to 1; a
/// self-loop sets the diagonal entry.
#[must_use]
pub fn adjacency_spectrum(graph: &MoveGraph) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }
    let mut m = DMatrix::<f64>::zeros(n, n);
    for edge in graph.graph.edge_references() {
        let (a, b) = (edge.source().index(), edge.target().index());
        m[(a, b)] = 1.0;
        m[(b, a)] = 1.0;
    }
    let mut values: Vec<f64> = SymmetricEigen::new(m).eigenvalues.iter().copied().collect();
    values.sort_unstable_by(|a, b| b.total_cmp(a));
    values
}

// ---------------------------------------------------------------------------
// Internal helpers (cast precision suppressed at function scope)
// ---------------------------------------------------------------------------

#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize, directed: bool) -> f64 {
    if node_count < 2 {
        return 0.0_f64;
    }
    let pairs = (node_count * (node_count - 1)) as f64;
    let edges = if directed { edge_count } else { 2 * edge_count };
    edges as f64 / pairs
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean(total: usize, count: usize) -> f64 {
    if count == 0 {
        return 0.0_f64;
    }
    total as f64 / count as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
