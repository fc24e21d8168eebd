//! Prerequisite cycle detection.
//!
//! Only meaningful in directed mode, where an edge `A -> B` means "A comes
//! before B". A cycle means the table claims a move is (transitively) its
//! own prerequisite.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::graph::MoveGraph;

/// Find all cycles currently present in `graph`.
///
/// Each entry is the sorted list of labels in one strongly connected
/// component with more than one member, or a single self-looping node.
/// Undirected graphs have no prerequisite order and yield nothing.
#[must_use]
pub fn find_cycles(graph: &MoveGraph) -> Vec<Vec<String>> {
    if !graph.directed {
        return Vec::new();
    }

    let g = &graph.graph;
    let mut cycles: Vec<Vec<String>> = tarjan_scc(g)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || component.first().is_some_and(|node| has_self_loop(g, *node))
        })
        .map(|component| {
            let mut labels: Vec<String> = component.into_iter().map(|idx| g[idx].clone()).collect();
            labels.sort_unstable();
            labels
        })
        .collect();

    cycles.sort_unstable();
    cycles
}

fn has_self_loop(graph: &DiGraph<String, ()>, node: NodeIndex) -> bool {
    graph.find_edge(node, node).is_some()
}
