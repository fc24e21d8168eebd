//! The `moves` table.

use std::collections::HashMap;

use serde::Serialize;

use super::{RELATION_DELIMITER, RelationColumn};

/// Canonical column order of the moves table.
pub const MOVE_COLUMNS: [&str; 6] = ["id", "name", "type", "prereq", "subseq", "description"];

/// One row of the moves table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Move {
    /// 1-based id; must be contiguous across the table.
    pub id: Option<i64>,
    /// Unique, case-sensitive name used as graph node identity.
    pub name: Option<String>,
    /// `/`-delimited category labels (`type` column).
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// `", "`-delimited names of moves that precede this one.
    pub prereq: Option<String>,
    /// `", "`-delimited names of moves that follow this one.
    pub subseq: Option<String>,
    /// Free text.
    pub description: Option<String>,
    /// Values of preserved non-canonical columns, aligned with
    /// [`MoveTable::extra_columns`].
    #[serde(skip)]
    pub extra: Vec<Option<String>>,
}

impl Move {
    /// Convenience constructor used heavily by tests and fixtures.
    #[must_use]
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id: Some(id),
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Builder: set the `prereq` cell.
    #[must_use]
    pub fn with_prereq(mut self, prereq: &str) -> Self {
        self.prereq = super::normalize_cell(prereq);
        self
    }

    /// Builder: set the `subseq` cell.
    #[must_use]
    pub fn with_subseq(mut self, subseq: &str) -> Self {
        self.subseq = super::normalize_cell(subseq);
        self
    }

    /// Builder: set the `type` cell.
    #[must_use]
    pub fn with_type(mut self, kind: &str) -> Self {
        self.kind = super::normalize_cell(kind);
        self
    }

    /// Raw value of one relation cell.
    #[must_use]
    pub fn relation(&self, column: RelationColumn) -> Option<&str> {
        match column {
            RelationColumn::Prereq => self.prereq.as_deref(),
            RelationColumn::Subseq => self.subseq.as_deref(),
        }
    }

    /// Mutable access to one relation cell.
    pub fn relation_mut(&mut self, column: RelationColumn) -> &mut Option<String> {
        match column {
            RelationColumn::Prereq => &mut self.prereq,
            RelationColumn::Subseq => &mut self.subseq,
        }
    }

    /// Replace a relation cell with the joined tokens, or absent when empty.
    pub fn set_relation<S: AsRef<str>>(&mut self, column: RelationColumn, tokens: &[S]) {
        let joined = tokens
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(RELATION_DELIMITER);
        *self.relation_mut(column) = if joined.is_empty() { None } else { Some(joined) };
    }

    /// `true` when the move has neither prerequisites nor subsequents.
    #[must_use]
    pub const fn is_isolated(&self) -> bool {
        self.prereq.is_none() && self.subseq.is_none()
    }
}

/// The full moves table in file row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveTable {
    /// Headers of preserved non-canonical columns, in file order.
    pub extra_columns: Vec<String>,
    /// Rows in file order.
    pub rows: Vec<Move>,
}

impl MoveTable {
    /// Build a table from rows with no extra columns.
    #[must_use]
    pub const fn new(rows: Vec<Move>) -> Self {
        Self {
            extra_columns: Vec::new(),
            rows,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.rows.iter()
    }

    /// The `id` column in row order.
    #[must_use]
    pub fn ids(&self) -> Vec<Option<i64>> {
        self.rows.iter().map(|m| m.id).collect()
    }

    /// Map each present name to every row index carrying it.
    #[must_use]
    pub fn name_index(&self) -> HashMap<&str, Vec<usize>> {
        let mut index: HashMap<&str, Vec<usize>> = HashMap::with_capacity(self.rows.len());
        for (row, mv) in self.rows.iter().enumerate() {
            if let Some(name) = mv.name.as_deref() {
                index.entry(name).or_default().push(row);
            }
        }
        index
    }

    /// Row index of the first move named `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|m| m.name.as_deref() == Some(name))
    }

    /// All column headers in write order.
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        MOVE_COLUMNS
            .iter()
            .map(|h| (*h).to_string())
            .chain(self.extra_columns.iter().cloned())
            .collect()
    }

    /// Values of one column by header, or `None` if the column is unknown.
    #[must_use]
    pub fn column(&self, header: &str) -> Option<Vec<Option<String>>> {
        let values = match header {
            "id" => self.rows.iter().map(|m| m.id.map(|id| id.to_string())).collect(),
            "name" => self.rows.iter().map(|m| m.name.clone()).collect(),
            "type" => self.rows.iter().map(|m| m.kind.clone()).collect(),
            "prereq" => self.rows.iter().map(|m| m.prereq.clone()).collect(),
            "subseq" => self.rows.iter().map(|m| m.subseq.clone()).collect(),
            "description" | "desc" => self.rows.iter().map(|m| m.description.clone()).collect(),
            other => {
                let pos = self.extra_columns.iter().position(|c| c == other)?;
                self.rows
                    .iter()
                    .map(|m| m.extra.get(pos).cloned().flatten())
                    .collect()
            }
        };
        Some(values)
    }
}

impl<'a> IntoIterator for &'a MoveTable {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_relation_joins_with_delimiter() {
        let mut mv = Move::new(1, "Kong");
        mv.set_relation(RelationColumn::Prereq, &["Cat Leap", "Dash Vault"]);
        assert_eq!(mv.prereq.as_deref(), Some("Cat Leap, Dash Vault"));
    }

    #[test]
    fn set_relation_empty_becomes_absent() {
        let mut mv = Move::new(1, "Kong").with_subseq("Double Kong");
        mv.set_relation::<&str>(RelationColumn::Subseq, &[]);
        assert!(mv.subseq.is_none());
        assert!(mv.is_isolated());
    }

    #[test]
    fn name_index_collects_every_occurrence() {
        let table = MoveTable::new(vec![
            Move::new(1, "Kong"),
            Move::new(2, "Dash"),
            Move::new(3, "Kong"),
        ]);
        let index = table.name_index();
        assert_eq!(index["Kong"], vec![0, 2]);
        assert_eq!(index["Dash"], vec![1]);
    }

    #[test]
    fn column_lookup_covers_extras() {
        let mut table = MoveTable::new(vec![Move::new(1, "Kong"), Move::new(2, "Dash")]);
        table.extra_columns.push("alias".to_string());
        table.rows[0].extra.push(Some("Monkey".to_string()));
        table.rows[1].extra.push(None);

        assert_eq!(
            table.column("alias"),
            Some(vec![Some("Monkey".to_string()), None])
        );
        assert_eq!(
            table.column("id"),
            Some(vec![Some("1".to_string()), Some("2".to_string())])
        );
        assert!(table.column("missing").is_none());
    }
}
