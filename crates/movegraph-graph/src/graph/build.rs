//! Graph construction from the moves table.
//!
//! # Nodes
//!
//! Every row becomes exactly one node, in row order, so node index `i` is
//! row `i` and `node_count() == table.len()` always holds. Rows with neither
//! `prereq` nor `subseq` are still added. A row without a name is labeled
//! `#<row>` (1-based).
//!
//! # Edges
//!
//! Edges come from [`crate::parse::parse_edges`]. Inserting the same pair
//! twice is a no-op; in undirected mode `(a, b)` and `(b, a)` are the same
//! pair. Unresolved tokens produce no edge.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::EdgeRef;
use tracing::{debug, instrument, warn};

use movegraph_core::{Move, MoveTable, RelationColumn};

use crate::error::GraphError;
use crate::parse::{ParsedEdges, parse_edges, row_tokens};

// ---------------------------------------------------------------------------
// MoveGraph
// ---------------------------------------------------------------------------

/// The move dependency graph.
#[derive(Debug, Clone)]
pub struct MoveGraph {
    /// Nodes are move labels. Undirected mode stores each pair once.
    pub graph: DiGraph<String, ()>,
    /// Label to node; a duplicated label maps to its first row.
    pub node_map: HashMap<String, NodeIndex>,
    pub directed: bool,
    /// BLAKE3 content hash of the sorted edge list.
    pub content_hash: String,
}

impl MoveGraph {
    /// Build the graph for `table`.
    #[must_use]
    #[instrument(skip(table), fields(rows = table.len()))]
    pub fn build(table: &MoveTable, directed: bool) -> Self {
        let parsed = parse_edges(table);
        for reference in &parsed.unresolved {
            debug!(
                row = reference.row,
                column = %reference.column,
                token = %reference.token,
                "skipping unresolved reference"
            );
        }
        Self::from_parsed(table, &parsed, directed)
    }

    /// Build from an already-parsed table.
    #[must_use]
    pub fn from_parsed(table: &MoveTable, parsed: &ParsedEdges, directed: bool) -> Self {
        let labels = table
            .iter()
            .enumerate()
            .map(|(row, mv)| node_label(mv, row))
            .collect();
        Self::assemble(
            labels,
            parsed.edges.iter().map(|e| (e.source, e.target)),
            directed,
        )
    }

    /// Build and then [`validate`](Self::validate) against `table`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] when the graph disagrees with the table,
    /// which happens exactly when some relation token does not resolve.
    pub fn build_validated(table: &MoveTable, directed: bool) -> Result<Self, GraphError> {
        let graph = Self::build(table, directed);
        graph.validate(table)?;
        Ok(graph)
    }

    /// Rebuild a graph from a persisted adjacency list.
    ///
    /// Keys become nodes in key order; neighbor names that are not keys are
    /// appended afterwards in sorted order.
    #[must_use]
    pub fn from_adjacency(adjacency: &BTreeMap<String, Vec<String>>, directed: bool) -> Self {
        let mut labels: Vec<String> = adjacency.keys().cloned().collect();
        let dangling: BTreeSet<&String> = adjacency
            .values()
            .flatten()
            .filter(|n| !adjacency.contains_key(*n))
            .collect();
        labels.extend(dangling.into_iter().cloned());

        let position: HashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let edges: Vec<(usize, usize)> = adjacency
            .iter()
            .flat_map(|(node, neighbors)| {
                let src = position[node.as_str()];
                neighbors.iter().map(move |n| (src, n))
            })
            .map(|(src, n)| (src, position[n.as_str()]))
            .collect();

        Self::assemble(labels, edges, directed)
    }

    fn assemble(
        labels: Vec<String>,
        edges: impl IntoIterator<Item = (usize, usize)>,
        directed: bool,
    ) -> Self {
        let mut graph = DiGraph::<String, ()>::with_capacity(labels.len(), labels.len());
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(labels.len());

        for label in labels {
            let idx = graph.add_node(label.clone());
            node_map.entry(label).or_insert(idx);
        }

        for (source, target) in edges {
            let (a, b) = (NodeIndex::new(source), NodeIndex::new(target));
            let present = graph.contains_edge(a, b) || (!directed && graph.contains_edge(b, a));
            if !present {
                graph.add_edge(a, b, ());
            }
        }

        let content_hash = compute_edge_hash(&sorted_edge_labels(&graph, directed));

        Self {
            graph,
            node_map,
            directed,
            content_hash,
        }
    }

    /// Check that the graph agrees exactly with `table`.
    ///
    /// For every row: its node exists under its label, and the node's
    /// neighbor set equals the row's own relation tokens together with the
    /// rows that name it. The node count must equal the row count.
    ///
    /// # Errors
    ///
    /// Returns the first disagreement found as a [`GraphError`].
    #[instrument(skip(self, table), fields(rows = table.len()))]
    pub fn validate(&self, table: &MoveTable) -> Result<(), GraphError> {
        if self.node_count() != table.len() {
            return Err(GraphError::NodeCount {
                nodes: self.node_count(),
                rows: table.len(),
            });
        }

        let index = table.name_index();
        let labels: Vec<String> = table
            .iter()
            .enumerate()
            .map(|(row, mv)| node_label(mv, row))
            .collect();

        let mut expected: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); table.len()];
        for (row, mv) in table.iter().enumerate() {
            for column in RelationColumn::ALL {
                for token in row_tokens(mv, column).tokens {
                    expected[row].insert(token);
                    if let Some(&target) = index.get(token).and_then(|rows| rows.first()) {
                        expected[target].insert(labels[row].as_str());
                    }
                }
            }
        }

        for (row, label) in labels.iter().enumerate() {
            let idx = NodeIndex::new(row);
            let present = self.label(idx) == Some(label.as_str())
                && self.node_map.contains_key(label.as_str());
            if !present {
                return Err(GraphError::Validation {
                    node: label.clone(),
                    missing: vec![label.clone()],
                    unexpected: Vec::new(),
                });
            }

            let actual: BTreeSet<&str> = self
                .graph
                .neighbors_undirected(idx)
                .filter_map(|n| self.label(n))
                .collect();

            if actual != expected[row] {
                let missing: Vec<String> = expected[row]
                    .difference(&actual)
                    .map(|s| (*s).to_string())
                    .collect();
                let unexpected: Vec<String> = actual
                    .difference(&expected[row])
                    .map(|s| (*s).to_string())
                    .collect();
                warn!(node = %label, ?missing, ?unexpected, "graph disagrees with table");
                return Err(GraphError::Validation {
                    node: label.clone(),
                    missing,
                    unexpected,
                });
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the node for a label (first row when duplicated).
    #[must_use]
    pub fn node_index(&self, label: &str) -> Option<NodeIndex> {
        self.node_map.get(label).copied()
    }

    #[must_use]
    pub fn label(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Adjacent nodes as exported: every neighbor in undirected mode,
    /// successors in directed mode.
    pub fn adjacent(&self, idx: NodeIndex) -> Box<dyn Iterator<Item = NodeIndex> + '_> {
        if self.directed {
            Box::new(self.graph.neighbors(idx))
        } else {
            Box::new(self.graph.neighbors_undirected(idx))
        }
    }

    /// Number of incident edges, ignoring direction. A self-loop counts twice.
    #[must_use]
    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.neighbors_undirected(idx).count()
    }

    /// Weakly connected components as sorted node positions, ordered by
    /// their lowest position.
    #[must_use]
    pub fn components(&self) -> Vec<Vec<usize>> {
        let n = self.node_count();
        let mut sets = UnionFind::<usize>::new(n);
        for edge in self.graph.edge_references() {
            sets.union(edge.source().index(), edge.target().index());
        }

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for node in 0..n {
            groups.entry(sets.find(node)).or_default().push(node);
        }

        let mut components: Vec<Vec<usize>> = groups.into_values().collect();
        components.sort_unstable_by_key(|c| c.first().copied());
        components
    }

    /// Sorted `(source, target)` label pairs; undirected pairs are ordered.
    #[must_use]
    pub fn edge_labels(&self) -> Vec<(String, String)> {
        sorted_edge_labels(&self.graph, self.directed)
    }
}

/// Label of the node for `mv` at 0-based `row`.
#[must_use]
pub fn node_label(mv: &Move, row: usize) -> String {
    mv.name.clone().unwrap_or_else(|| format!("#{}", row + 1))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn sorted_edge_labels(graph: &DiGraph<String, ()>, directed: bool) -> Vec<(String, String)> {
    let mut edges: Vec<(String, String)> = graph
        .edge_references()
        .map(|e| {
            let a = graph[e.source()].clone();
            let b = graph[e.target()].clone();
            if !directed && b < a { (b, a) } else { (a, b) }
        })
        .collect();
    edges.sort_unstable();
    edges
}

/// Compute a BLAKE3 hash of the sorted edge list.
fn compute_edge_hash(edges: &[(String, String)]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (source, target) in edges {
        hasher.update(source.as_bytes());
        hasher.update(b"\x00");
        hasher.update(target.as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
