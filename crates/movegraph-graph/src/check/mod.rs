//! Consistency checks over the moves table.
//!
//! Every check is pure: table in, findings out. Findings are values for the
//! diagnostics document, never errors.

pub mod edges;
pub mod ids;
pub mod labels;
pub mod missing;
pub mod names;
pub mod symmetry;

use std::collections::BTreeMap;

use tracing::{info, instrument};

use movegraph_core::MoveTable;
use movegraph_core::diagnostics::{
    Diagnostics, DuplicateEdgeReport, DuplicateName, IdMismatch, MoveTypeReport, SymmetryReport,
};

pub use edges::duplicate_edges;
pub use ids::{invalid_ids, invalid_ids_against};
pub use labels::{canonical_label, check_move_types};
pub use missing::{find_empty, incomplete};
pub use names::duplicate_names;
pub use symmetry::{adjacency_matrix, check_symmetry};

/// Findings of every table check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveChecks {
    pub invalid_ids: Vec<IdMismatch>,
    pub duplicate_edges: DuplicateEdgeReport,
    pub duplicate_nodes: Vec<DuplicateName>,
    pub symmetry: SymmetryReport,
    pub incomplete: BTreeMap<String, Vec<usize>>,
    pub move_types: MoveTypeReport,
}

impl MoveChecks {
    /// Run all checks.
    #[must_use]
    #[instrument(skip_all, fields(rows = table.len()))]
    pub fn run<S: AsRef<str>>(table: &MoveTable, columns: &[S], whitelist: &[usize]) -> Self {
        let checks = Self {
            invalid_ids: invalid_ids(&table.ids()),
            duplicate_edges: duplicate_edges(table),
            duplicate_nodes: duplicate_names(table),
            symmetry: check_symmetry(table),
            incomplete: incomplete(table, columns, whitelist),
            move_types: check_move_types(table),
        };
        info!(
            invalid_ids = checks.invalid_ids.len(),
            duplicate_nodes = checks.duplicate_nodes.len(),
            asymmetric = checks.symmetry.asymmetric.len(),
            ambiguous_types = checks.move_types.ambiguous.len(),
            "table checks complete"
        );
        checks
    }

    /// `true` when no check found anything.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.invalid_ids.is_empty()
            && self.duplicate_edges.is_empty()
            && self.duplicate_nodes.is_empty()
            && self.symmetry.asymmetric.is_empty()
            && self.symmetry.unresolved.is_empty()
            && self.incomplete.values().all(Vec::is_empty)
            && self.move_types.is_clean()
    }

    /// Move the findings into their fields of the diagnostics document.
    pub fn record(self, diagnostics: &mut Diagnostics) {
        diagnostics.invalid_ids = Some(self.invalid_ids);
        diagnostics.duplicate_edges = Some(self.duplicate_edges);
        diagnostics.duplicate_nodes = Some(self.duplicate_nodes);
        diagnostics.symmetry = Some(self.symmetry);
        diagnostics.incomplete = Some(self.incomplete);
        diagnostics.move_types = Some(self.move_types);
    }
}
