//! Duplicate move names.

use movegraph_core::MoveTable;
use movegraph_core::diagnostics::DuplicateName;

/// Every row whose name appears on more than one row, in row order.
///
/// All occurrences are returned, not only the repeats, so each can be
/// resolved by hand. Rows without a name are never duplicates.
#[must_use]
pub fn duplicate_names(table: &MoveTable) -> Vec<DuplicateName> {
    let index = table.name_index();
    table
        .iter()
        .enumerate()
        .filter_map(|(row, mv)| {
            let name = mv.name.as_deref()?;
            (index.get(name).map_or(0, Vec::len) > 1).then(|| DuplicateName {
                row: row + 1,
                id: mv.id,
                name: name.to_string(),
            })
        })
        .collect()
}
