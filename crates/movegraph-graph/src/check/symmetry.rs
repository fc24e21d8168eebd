//! Adjacency-matrix symmetry.
//!
//! The matrix is indexed by move id (`id - 1`) and counts every reference in
//! either relation column, so `m[a][b]` is how many times row `a` names row
//! `b`. A consistent table names each neighbor from both sides, giving a
//! symmetric matrix.
//!
//! Any count mismatch is reported, including duplicate-count mismatches
//! such as 2 against 1.

use nalgebra::DMatrix;
use tracing::{debug, instrument};

use movegraph_core::diagnostics::{Coordinate, SymmetryReport, UnresolvedReason, UnresolvedReference};
use movegraph_core::{MoveTable, RelationColumn};

use crate::parse::row_tokens;

/// Build the id-indexed `N x N` reference count matrix.
///
/// References that cannot be placed are returned instead of counted: the
/// token names no move, names several, or either endpoint lacks an id in
/// `1..=N`.
#[must_use]
pub fn adjacency_matrix(table: &MoveTable) -> (DMatrix<u32>, Vec<UnresolvedReference>) {
    let n = table.len();
    let mut m = DMatrix::<u32>::zeros(n, n);
    let mut unresolved = Vec::new();
    let index = table.name_index();

    let slot = |id: Option<i64>| {
        id.and_then(|id| usize::try_from(id).ok())
            .filter(|id| (1..=n).contains(id))
            .map(|id| id - 1)
    };

    for (row, mv) in table.iter().enumerate() {
        let source = slot(mv.id);
        for column in RelationColumn::ALL {
            for token in row_tokens(mv, column).tokens {
                let resolved = match index.get(token).map(Vec::as_slice) {
                    None | Some([]) => Err(UnresolvedReason::UnknownName),
                    Some([target]) => source
                        .zip(slot(table.rows[*target].id))
                        .ok_or(UnresolvedReason::NoId),
                    Some(_) => Err(UnresolvedReason::AmbiguousName),
                };

                match resolved {
                    Ok((a, b)) => m[(a, b)] += 1,
                    Err(reason) => {
                        debug!(row = row + 1, %column, token, ?reason, "skipping reference in adjacency matrix");
                        unresolved.push(UnresolvedReference {
                            row: row + 1,
                            column,
                            token: token.to_string(),
                            reason,
                        });
                    }
                }
            }
        }
    }

    (m, unresolved)
}

/// Upper-triangular, 1-indexed positions where the matrix differs from its
/// transpose.
#[must_use]
pub fn asymmetric_positions(m: &DMatrix<u32>) -> Vec<Coordinate> {
    if m == &m.transpose() {
        return Vec::new();
    }
    let n = m.nrows();
    let mut out = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if m[(i, j)] != m[(j, i)] {
                out.push(Coordinate(i + 1, j + 1));
            }
        }
    }
    out
}

/// Run the symmetry check over `table`.
#[must_use]
#[instrument(skip(table), fields(rows = table.len()))]
pub fn check_symmetry(table: &MoveTable) -> SymmetryReport {
    let (m, unresolved) = adjacency_matrix(table);
    SymmetryReport {
        asymmetric: asymmetric_positions(&m),
        unresolved,
    }
}
