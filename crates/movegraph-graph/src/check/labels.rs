//! Multi-label canonicalization.
//!
//! A type string such as `"Wall/Flips"` is a `/`-separated set of labels.
//! Its canonical key is built by lower-casing, splitting on `/`, trimming
//! each label, dropping one trailing `s`, and sorting:
//! `"Wall/Flips"` and `"flip/wall"` both become `"flip/wall"`.
//!
//! Distinct spellings that share a key are ambiguous and get reported; they
//! are never merged silently.

use std::collections::{BTreeMap, BTreeSet};

use movegraph_core::MoveTable;
use movegraph_core::diagnostics::{LabelAmbiguity, MoveTypeReport};
use movegraph_core::model::LABEL_DELIMITER;

/// Canonical comparison key of a type string.
#[must_use]
pub fn canonical_label(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut labels: Vec<&str> = lowered
        .split(LABEL_DELIMITER)
        .map(|label| {
            let label = label.trim();
            label.strip_suffix('s').unwrap_or(label).trim_end()
        })
        .filter(|label| !label.is_empty())
        .collect();
    labels.sort_unstable();
    labels.join("/")
}

/// Group the table's type strings by canonical key and report every key
/// reached by more than one distinct spelling.
#[must_use]
pub fn check_move_types(table: &MoveTable) -> MoveTypeReport {
    let mut buckets: BTreeMap<String, BTreeSet<&str>> = BTreeMap::new();
    let mut malformed: BTreeSet<&str> = BTreeSet::new();

    for raw in table.iter().filter_map(|mv| mv.kind.as_deref()) {
        let key = canonical_label(raw);
        if key.is_empty() {
            malformed.insert(raw);
        } else {
            buckets.entry(key).or_default().insert(raw);
        }
    }

    let ambiguous = buckets
        .into_iter()
        .filter(|(_, variants)| variants.len() > 1)
        .map(|(canonical, variants)| LabelAmbiguity {
            canonical,
            variants: variants.into_iter().map(str::to_string).collect(),
        })
        .collect();

    MoveTypeReport {
        ambiguous,
        malformed: malformed.into_iter().map(str::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use movegraph_core::Move;

    #[test]
    fn canonical_form_ignores_order_case_and_plurals() {
        assert_eq!(canonical_label("Wall/Flip"), "flip/wall");
        assert_eq!(canonical_label("Flip/Wall"), "flip/wall");
        assert_eq!(canonical_label("Bars"), canonical_label("Bar"));
        assert_eq!(canonical_label(" Parallel Bars / Vault "), "parallel bar/vault");
    }

    #[test]
    fn permuted_spellings_are_flagged() {
        let table = MoveTable::new(vec![
            Move::new(1, "A").with_type("Wall/Flip"),
            Move::new(2, "B").with_type("Flip/Wall"),
            Move::new(3, "C").with_type("Wall/Flip"),
            Move::new(4, "D").with_type("Vault"),
        ]);
        let report = check_move_types(&table);
        assert_eq!(
            report.ambiguous,
            vec![LabelAmbiguity {
                canonical: "flip/wall".to_string(),
                variants: vec!["Flip/Wall".to_string(), "Wall/Flip".to_string()],
            }]
        );
        assert!(report.malformed.is_empty());
    }

    #[test]
    fn consistent_spellings_are_clean() {
        let table = MoveTable::new(vec![
            Move::new(1, "A").with_type("Wall/Flip"),
            Move::new(2, "B").with_type("Wall/Flip"),
            Move::new(3, "C"),
        ]);
        assert!(check_move_types(&table).is_clean());
    }

    #[test]
    fn separator_only_types_are_malformed() {
        let table = MoveTable::new(vec![Move::new(1, "A").with_type("/")]);
        assert_eq!(check_move_types(&table).malformed, vec!["/".to_string()]);
    }
}
