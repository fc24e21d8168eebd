//! Duplicate tokens within a single relation cell.

use std::collections::{BTreeSet, HashSet};

use movegraph_core::diagnostics::{CellDuplicates, DuplicateEdgeReport};
use movegraph_core::{MoveTable, RelationColumn};

use crate::parse::row_tokens;

/// Rows listing the same move more than once in one `prereq` or `subseq`
/// cell, grouped by column.
#[must_use]
pub fn duplicate_edges(table: &MoveTable) -> DuplicateEdgeReport {
    let mut report = DuplicateEdgeReport::default();

    for (row, mv) in table.iter().enumerate() {
        for column in RelationColumn::ALL {
            let mut seen = HashSet::new();
            let repeated: BTreeSet<&str> = row_tokens(mv, column)
                .tokens
                .into_iter()
                .filter(|token| !seen.insert(*token))
                .collect();

            if !repeated.is_empty() {
                report.column_mut(column).push(CellDuplicates {
                    row: row + 1,
                    tokens: repeated.into_iter().map(str::to_string).collect(),
                });
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use movegraph_core::Move;

    #[test]
    fn reports_repeats_per_column() {
        let table = MoveTable::new(vec![
            Move::new(1, "Kong")
                .with_prereq("Cat Leap, Dash, Cat Leap")
                .with_subseq("Double Kong"),
            Move::new(2, "Dash").with_subseq("Kong, Kong, Kong"),
        ]);
        let report = duplicate_edges(&table);
        assert_eq!(
            report.prereq,
            vec![CellDuplicates {
                row: 1,
                tokens: vec!["Cat Leap".to_string()],
            }]
        );
        assert_eq!(
            report.subseq,
            vec![CellDuplicates {
                row: 2,
                tokens: vec!["Kong".to_string()],
            }]
        );
    }

    #[test]
    fn same_token_in_both_columns_is_not_a_duplicate() {
        let table = MoveTable::new(vec![Move::new(1, "Kong").with_prereq("Dash").with_subseq("Dash")]);
        assert!(duplicate_edges(&table).is_empty());
    }
}
