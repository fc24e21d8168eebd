//! Adjacency-list export and integer relabeling.
//!
//! Downstream learning code wants consecutive integer node ids. The name map
//! assigns each move its 0-based row position; [`relabel`] rewrites an
//! adjacency list through it and refuses to return anything that cannot be
//! mapped back to the original edge set.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::instrument;

use movegraph_core::MoveTable;
use movegraph_core::diagnostics::EdgeCountCheck;

use crate::error::GraphError;
use crate::graph::MoveGraph;
use crate::graph::build::node_label;
use crate::parse::ParsedEdges;

/// Node label to sorted, deduplicated neighbor labels.
pub type AdjacencyList = BTreeMap<String, Vec<String>>;

/// Integer node id to sorted neighbor ids.
pub type IntAdjacencyList = BTreeMap<usize, Vec<usize>>;

/// Export the graph as an adjacency list.
///
/// Undirected graphs list each edge under both endpoints; directed graphs
/// list successors only. When two rows share a label their neighbor lists
/// are merged under that label.
#[must_use]
pub fn adjacency_list(graph: &MoveGraph) -> AdjacencyList {
    let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for idx in graph.graph.node_indices() {
        let label = graph.graph[idx].clone();
        let neighbors = adjacency.entry(label).or_default();
        for n in graph.adjacent(idx) {
            neighbors.insert(graph.graph[n].clone());
        }
    }
    adjacency
        .into_iter()
        .map(|(k, v)| (k, v.into_iter().collect()))
        .collect()
}

/// Map each node label to its 0-based row position.
///
/// Labels are the ones the graph builder assigns, so a row without a name
/// maps under `#<row>`. A duplicated label keeps its first row.
#[must_use]
pub fn name_to_int(table: &MoveTable) -> BTreeMap<String, usize> {
    let mut map = BTreeMap::new();
    for (row, mv) in table.iter().enumerate() {
        map.entry(node_label(mv, row)).or_insert(row);
    }
    map
}

/// Rewrite `adjacency` through `name_map`, then prove the result inverts.
///
/// # Errors
///
/// Returns [`GraphError::UnknownNode`] when a label has no integer id and
/// [`GraphError::Relabel`] when two labels share an id or the inverted
/// relabeling does not reproduce the original edge set.
#[instrument(skip_all, fields(nodes = adjacency.len()))]
pub fn relabel(
    adjacency: &AdjacencyList,
    name_map: &BTreeMap<String, usize>,
) -> Result<IntAdjacencyList, GraphError> {
    let lookup = |label: &str| {
        name_map
            .get(label)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(label.to_string()))
    };

    let mut relabeled: IntAdjacencyList = BTreeMap::new();
    for (node, neighbors) in adjacency {
        let mut ids = neighbors
            .iter()
            .map(|n| lookup(n))
            .collect::<Result<Vec<_>, _>>()?;
        ids.sort_unstable();
        ids.dedup();
        relabeled.insert(lookup(node)?, ids);
    }

    let mut inverse: BTreeMap<usize, &str> = BTreeMap::new();
    for (name, id) in name_map {
        if let Some(previous) = inverse.insert(*id, name.as_str()) {
            return Err(GraphError::Relabel(format!(
                "`{previous}` and `{name}` both map to {id}"
            )));
        }
    }

    let inverse = &inverse;
    let original = edge_set(
        adjacency
            .iter()
            .map(|(k, v)| (k.as_str(), v.iter().map(String::as_str))),
    );
    let restored = edge_set(relabeled.iter().map(|(k, v)| {
        (
            inverse.get(k).copied().unwrap_or_default(),
            v.iter()
                .map(move |id| inverse.get(id).copied().unwrap_or_default()),
        )
    }));

    if original != restored {
        return Err(GraphError::Relabel(format!(
            "{} edges before, {} after inversion",
            original.len(),
            restored.len()
        )));
    }

    Ok(relabeled)
}

fn edge_set<'a, N>(lists: impl Iterator<Item = (&'a str, N)>) -> BTreeSet<(&'a str, &'a str)>
where
    N: Iterator<Item = &'a str>,
{
    lists
        .flat_map(|(node, neighbors)| neighbors.map(move |n| (node, n)))
        .collect()
}

/// Load an adjacency list written by [`adjacency_list`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON object of
/// string arrays.
pub fn read_adjacency(path: &Path) -> Result<AdjacencyList> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Compare the graph's edge count with half the resolved token count.
///
/// A symmetric, duplicate-free table lists every edge once on each
/// endpoint, so the two agree; any asymmetry or duplicate makes them differ.
#[must_use]
pub fn edge_count_check(graph: &MoveGraph, parsed: &ParsedEdges) -> EdgeCountCheck {
    let resolved_tokens = parsed.resolved_tokens();
    EdgeCountCheck {
        graph_edges: graph.edge_count(),
        resolved_tokens,
        expected_edges: resolved_tokens / 2,
    }
}
