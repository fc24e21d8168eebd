//! Id contiguity.

use movegraph_core::diagnostics::{IdCell, IdMismatch};

/// Compare `ids` element-wise with `1..=ids.len()`.
#[must_use]
pub fn invalid_ids(ids: &[Option<i64>]) -> Vec<IdMismatch> {
    invalid_ids_against(ids, ids.len())
}

/// Compare `ids` element-wise with `1..=expected_len`.
///
/// Positions present on only one side pair with [`IdCell::Missing`], as do
/// empty id cells. Only diverging positions are returned.
#[must_use]
pub fn invalid_ids_against(ids: &[Option<i64>], expected_len: usize) -> Vec<IdMismatch> {
    let width = ids.len().max(expected_len);
    (0..width)
        .filter_map(|pos| {
            let actual = ids
                .get(pos)
                .copied()
                .flatten()
                .map_or(IdCell::Missing, IdCell::Id);
            let expected = if pos < expected_len {
                i64::try_from(pos + 1).map_or(IdCell::Missing, IdCell::Id)
            } else {
                IdCell::Missing
            };
            (actual != expected).then_some(IdMismatch { actual, expected })
        })
        .collect()
}
