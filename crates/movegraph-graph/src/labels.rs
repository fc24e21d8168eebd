//! Type-label statistics.
//!
//! A move's `type` cell is a `/`-separated set of labels (`"Wall/Flip"`).
//! Distributions come in two flavours: per token, where each label is
//! counted on its own, and per combination, where the whole type string is
//! one label. Moves without a type are left out of both.

use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;
use serde::Serialize;

use movegraph_core::MoveTable;
use movegraph_core::model::LABEL_DELIMITER;

use crate::graph::MoveGraph;
use crate::graph::stats::mean;

/// Trimmed, non-empty labels of a type cell, in cell order.
#[must_use]
pub fn type_tokens(kind: Option<&str>) -> Vec<&str> {
    kind.map_or_else(Vec::new, |kind| {
        kind.split(LABEL_DELIMITER)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    /// Each `/`-separated label counts once.
    PerToken,
    /// The whole type string is one label.
    PerCombination,
}

/// Label frequencies, sorted by label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelDistribution {
    pub counts: BTreeMap<String, usize>,
}

impl LabelDistribution {
    #[must_use]
    pub fn from_table(table: &MoveTable, mode: LabelMode) -> Self {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for kind in table.iter().filter_map(|mv| mv.kind.as_deref()) {
            match mode {
                LabelMode::PerToken => {
                    for token in type_tokens(Some(kind)) {
                        *counts.entry(token.to_string()).or_default() += 1;
                    }
                }
                LabelMode::PerCombination => {
                    *counts.entry(kind.trim().to_string()).or_default() += 1;
                }
            }
        }
        Self { counts }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Share of each label in the whole distribution.
    #[must_use]
    pub fn percentages(&self) -> BTreeMap<String, f64> {
        let total = self.total();
        self.counts
            .iter()
            .map(|(label, count)| (label.clone(), mean(*count, total)))
            .collect()
    }
}

/// Mean graph degree of the moves carrying each type label.
#[must_use]
pub fn average_degree_by_type(graph: &MoveGraph, table: &MoveTable) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (row, mv) in table.iter().enumerate() {
        if row >= graph.node_count() {
            break;
        }
        let degree = graph.degree(NodeIndex::new(row));
        for token in type_tokens(mv.kind.as_deref()) {
            let entry = sums.entry(token).or_default();
            entry.0 += degree;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(label, (total, count))| (label.to_string(), mean(total, count)))
        .collect()
}

/// Label counts inside one connected component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentLabels {
    /// Position of the component, ordered by lowest row.
    pub component: usize,
    pub size: usize,
    /// Whole type strings.
    pub aggregated: BTreeMap<String, usize>,
    /// Individual labels.
    pub multi_hot: BTreeMap<String, usize>,
}

#[must_use]
pub fn component_labels(graph: &MoveGraph, table: &MoveTable) -> Vec<ComponentLabels> {
    graph
        .components()
        .into_iter()
        .enumerate()
        .map(|(component, rows)| {
            let mut aggregated: BTreeMap<String, usize> = BTreeMap::new();
            let mut multi_hot: BTreeMap<String, usize> = BTreeMap::new();
            for kind in rows
                .iter()
                .filter_map(|row| table.rows.get(*row))
                .filter_map(|mv| mv.kind.as_deref())
            {
                *aggregated.entry(kind.trim().to_string()).or_default() += 1;
                for token in type_tokens(Some(kind)) {
                    *multi_hot.entry(token.to_string()).or_default() += 1;
                }
            }
            ComponentLabels {
                component,
                size: rows.len(),
                aggregated,
                multi_hot,
            }
        })
        .collect()
}

/// Move name to its type labels. Unnamed moves are skipped; a repeated
/// name keeps its first row.
#[must_use]
pub fn extract_labels(table: &MoveTable) -> BTreeMap<String, Vec<String>> {
    let mut labels = BTreeMap::new();
    for mv in table.iter() {
        if let Some(name) = &mv.name {
            labels.entry(name.clone()).or_insert_with(|| {
                type_tokens(mv.kind.as_deref())
                    .into_iter()
                    .map(str::to_string)
                    .collect()
            });
        }
    }
    labels
}
