//! Edge parser: relation cells to directed edges.
//!
//! A relation cell holds move names separated by `", "`. Each token is
//! trimmed. A token that trims to nothing (trailing delimiter, doubled
//! delimiter) is reported as an [`EmptyToken`] and never becomes an edge.
//!
//! Direction: a `prereq` token `P` on move `S` yields `P -> S`; a `subseq`
//! token `T` on move `S` yields `S -> T`.
//!
//! A token naming no move is a referential-integrity finding
//! ([`UnresolvedReference`]); parsing continues with the next token.

use tracing::debug;

use movegraph_core::diagnostics::{EmptyToken, UnresolvedReason, UnresolvedReference};
use movegraph_core::model::RELATION_DELIMITER;
use movegraph_core::{Move, MoveTable, RelationColumn};

/// Tokens of one relation cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellTokens<'a> {
    /// Trimmed, non-empty tokens in cell order.
    pub tokens: Vec<&'a str>,
    /// Number of zero-length tokens dropped.
    pub empty: usize,
}

/// Split one relation cell on the delimiter.
///
/// An absent cell yields no tokens.
#[must_use]
pub fn split_cell(cell: Option<&str>) -> CellTokens<'_> {
    let mut out = CellTokens::default();
    let Some(cell) = cell else {
        return out;
    };

    for raw in cell.split(RELATION_DELIMITER) {
        let token = raw.trim();
        if token.is_empty() {
            out.empty += 1;
        } else {
            out.tokens.push(token);
        }
    }
    out
}

/// Tokens of `column` on `mv`.
#[must_use]
pub fn row_tokens(mv: &Move, column: RelationColumn) -> CellTokens<'_> {
    split_cell(mv.relation(column))
}

/// An edge between two table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowEdge {
    /// 0-based row of the edge source.
    pub source: usize,
    /// 0-based row of the edge target.
    pub target: usize,
    /// 0-based row whose cell produced the edge.
    pub origin: usize,
    pub column: RelationColumn,
}

/// Everything the parser found in a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEdges {
    pub edges: Vec<RowEdge>,
    pub unresolved: Vec<UnresolvedReference>,
    pub empty_tokens: Vec<EmptyToken>,
}

impl ParsedEdges {
    /// Number of tokens that resolved to a row.
    #[must_use]
    pub fn resolved_tokens(&self) -> usize {
        self.edges.len()
    }
}

/// Parse every relation cell of `table` into row edges.
///
/// Names resolve to the first row that carries them; duplicate names are
/// the concern of [`crate::check::names`].
#[must_use]
pub fn parse_edges(table: &MoveTable) -> ParsedEdges {
    let index = table.name_index();
    let mut parsed = ParsedEdges::default();

    for (row, mv) in table.iter().enumerate() {
        for column in RelationColumn::ALL {
            let cell = row_tokens(mv, column);

            if cell.empty > 0 {
                debug!(row = row + 1, %column, "dropping empty relation token");
                parsed.empty_tokens.push(EmptyToken {
                    row: row + 1,
                    column,
                    cell: mv.relation(column).unwrap_or_default().to_string(),
                });
            }

            for token in cell.tokens {
                let Some(&target) = index.get(token).and_then(|rows| rows.first()) else {
                    debug!(row = row + 1, %column, token, "unresolved relation token");
                    parsed.unresolved.push(UnresolvedReference {
                        row: row + 1,
                        column,
                        token: token.to_string(),
                        reason: UnresolvedReason::UnknownName,
                    });
                    continue;
                };

                let (source, target) = match column {
                    RelationColumn::Prereq => (target, row),
                    RelationColumn::Subseq => (row, target),
                };
                parsed.edges.push(RowEdge {
                    source,
                    target,
                    origin: row,
                    column,
                });
            }
        }
    }

    parsed
}
