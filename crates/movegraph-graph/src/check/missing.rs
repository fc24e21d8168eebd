//! Missing-value scan.

use std::collections::BTreeMap;

use tracing::warn;

use movegraph_core::MoveTable;

/// 1-based rows where `values` is absent, skipping whitelisted rows.
#[must_use]
pub fn find_empty(values: &[Option<String>], whitelist: &[usize]) -> Vec<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_none())
        .map(|(pos, _)| pos + 1)
        .filter(|row| !whitelist.contains(row))
        .collect()
}

/// Run [`find_empty`] over each named column.
///
/// Columns the table does not have are logged and left out of the result.
#[must_use]
pub fn incomplete<S: AsRef<str>>(
    table: &MoveTable,
    columns: &[S],
    whitelist: &[usize],
) -> BTreeMap<String, Vec<usize>> {
    let mut out = BTreeMap::new();
    for column in columns {
        let column = column.as_ref();
        match table.column(column) {
            Some(values) => {
                out.insert(column.to_string(), find_empty(&values, whitelist));
            }
            None => warn!(column, "skipping missing-value scan of unknown column"),
        }
    }
    out
}
