//! Canonical on-disk order for relation cells.

use movegraph_core::{MoveTable, RelationColumn};

use crate::parse::row_tokens;

/// Rewrite every relation cell with its tokens trimmed and sorted.
///
/// Empty tokens are dropped and a cell with no tokens left becomes absent.
/// Repeated tokens are kept so the duplicate-edge check still sees them.
/// Applying this twice gives the same table as applying it once.
#[must_use]
pub fn sort_edges(table: &MoveTable) -> MoveTable {
    let mut sorted = table.clone();
    for mv in &mut sorted.rows {
        for column in RelationColumn::ALL {
            if mv.relation(column).is_none() {
                continue;
            }
            let mut tokens: Vec<String> = row_tokens(mv, column)
                .tokens
                .into_iter()
                .map(str::to_string)
                .collect();
            tokens.sort_unstable();
            mv.set_relation(column, &tokens);
        }
    }
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use movegraph_core::Move;

    #[test]
    fn sorts_tokens_alphabetically() {
        let table = MoveTable::new(vec![Move::new(1, "Kong")
            .with_prereq("Dash Vault, Cat Leap")
            .with_subseq("Kash, Double Kong")]);
        let sorted = sort_edges(&table);
        assert_eq!(sorted.rows[0].prereq.as_deref(), Some("Cat Leap, Dash Vault"));
        assert_eq!(sorted.rows[0].subseq.as_deref(), Some("Double Kong, Kash"));
    }

    #[test]
    fn stray_delimiters_are_cleaned() {
        let table = MoveTable::new(vec![
            Move::new(1, "Kong").with_prereq("Dash, , Cat Leap, "),
            Move::new(2, "Dash").with_subseq(", "),
        ]);
        let sorted = sort_edges(&table);
        assert_eq!(sorted.rows[0].prereq.as_deref(), Some("Cat Leap, Dash"));
        assert!(sorted.rows[1].subseq.is_none());
    }

    #[test]
    fn duplicates_survive_sorting() {
        let table = MoveTable::new(vec![Move::new(1, "Kong").with_subseq("B, A, B")]);
        assert_eq!(sort_edges(&table).rows[0].subseq.as_deref(), Some("A, B, B"));
    }

    #[test]
    fn input_table_is_untouched() {
        let table = MoveTable::new(vec![Move::new(1, "Kong").with_prereq("B, A")]);
        let _ = sort_edges(&table);
        assert_eq!(table.rows[0].prereq.as_deref(), Some("B, A"));
    }
}
