//! Bag-of-words features for move-type classification.
//!
//! Each move gets a term-count vector over the whitespace-separated words of
//! all move names and a label vector. Labels come in two encodings:
//! multi-hot over the individual `/`-separated type labels, or one-hot over
//! whole type strings (each distinct string is one class). Vocabularies and
//! label maps are sorted so the same table always yields the same indices.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::info;

use movegraph_core::{Move, MoveTable};

use crate::graph::build::node_label;
use crate::labels::type_tokens;

const MULTI_HOT_DESCRIPTION: &str =
    "Multi-hot classification of move types using bag-of-words of move names as features.";
const ONE_HOT_DESCRIPTION: &str =
    "One-hot classification of move types using bag-of-words of move names as features.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelEncoding {
    /// One slot per individual type label.
    MultiHot,
    /// One slot per whole type string; at most one slot is set.
    OneHot,
}

impl LabelEncoding {
    const fn task(self) -> &'static str {
        match self {
            Self::MultiHot => "multihot",
            Self::OneHot => "onehot",
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::MultiHot => MULTI_HOT_DESCRIPTION,
            Self::OneHot => ONE_HOT_DESCRIPTION,
        }
    }

    fn labels(self, mv: &Move) -> Vec<&str> {
        match self {
            Self::MultiHot => type_tokens(mv.kind.as_deref()),
            Self::OneHot => mv
                .kind
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .into_iter()
                .collect(),
        }
    }
}

/// Features of one move, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveFeatures {
    pub name: String,
    pub bag: Vec<u32>,
    pub label: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BagOfWords {
    pub task: &'static str,
    pub desc: &'static str,
    pub vocabulary: Vec<String>,
    pub label_map: BTreeMap<String, usize>,
    pub features: Vec<MoveFeatures>,
}

impl BagOfWords {
    /// Term bags with multi-hot type labels.
    #[must_use]
    pub fn from_table(table: &MoveTable) -> Self {
        Self::encode(table, LabelEncoding::MultiHot)
    }

    /// Term bags with one-hot labels over whole type strings. Untyped moves
    /// get an all-zero label.
    #[must_use]
    pub fn one_hot(table: &MoveTable) -> Self {
        Self::encode(table, LabelEncoding::OneHot)
    }

    #[must_use]
    pub fn encode(table: &MoveTable, encoding: LabelEncoding) -> Self {
        let vocabulary: Vec<String> = table
            .iter()
            .filter_map(|mv| mv.name.as_deref())
            .flat_map(str::split_whitespace)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let term_index: BTreeMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        let label_map: BTreeMap<String, usize> = table
            .iter()
            .flat_map(|mv| encoding.labels(mv))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .enumerate()
            .map(|(i, label)| (label.to_string(), i))
            .collect();

        let features = table
            .iter()
            .enumerate()
            .map(|(row, mv)| {
                let mut bag = vec![0_u32; vocabulary.len()];
                for term in mv.name.as_deref().unwrap_or_default().split_whitespace() {
                    if let Some(&i) = term_index.get(term) {
                        bag[i] += 1;
                    }
                }
                let mut label = vec![0_u8; label_map.len()];
                for token in encoding.labels(mv) {
                    if let Some(&i) = label_map.get(token) {
                        label[i] = 1;
                    }
                }
                MoveFeatures {
                    name: node_label(mv, row),
                    bag,
                    label,
                }
            })
            .collect();

        info!(
            task = encoding.task(),
            terms = vocabulary.len(),
            labels = label_map.len(),
            moves = table.len(),
            "built bag-of-words features"
        );

        Self {
            task: encoding.task(),
            desc: encoding.description(),
            vocabulary,
            label_map,
            features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_terms_and_marks_labels() {
        let table = MoveTable::new(vec![
            Move::new(1, "Double Kong Kong").with_type("Vault"),
            Move::new(2, "Wall Flip").with_type("Wall/Flip"),
        ]);
        let bow = BagOfWords::from_table(&table);
        assert_eq!(bow.vocabulary, vec!["Double", "Flip", "Kong", "Wall"]);
        assert_eq!(bow.features[0].bag, vec![1, 0, 2, 0]);
        assert_eq!(bow.label_map.keys().collect::<Vec<_>>(), vec!["Flip", "Vault", "Wall"]);
        assert_eq!(bow.features[1].label, vec![1, 0, 1]);
    }

    #[test]
    fn untyped_and_unnamed_rows_get_zero_vectors() {
        let mut nameless = Move::new(2, "x");
        nameless.name = None;
        let table = MoveTable::new(vec![Move::new(1, "Dash"), nameless]);
        let bow = BagOfWords::from_table(&table);
        assert_eq!(bow.features[1].name, "#2");
        assert_eq!(bow.features[1].bag, vec![0]);
        assert!(bow.features[0].label.is_empty());
    }

    #[test]
    fn one_hot_uses_whole_type_strings() {
        let table = MoveTable::new(vec![
            Move::new(1, "Wall Flip").with_type("Wall/Flip"),
            Move::new(2, "Back Flip").with_type("Flip"),
            Move::new(3, "Tic Tac").with_type("Wall/Flip"),
            Move::new(4, "Roll"),
        ]);
        let bow = BagOfWords::one_hot(&table);
        assert_eq!(bow.task, "onehot");
        assert_eq!(bow.label_map.keys().collect::<Vec<_>>(), vec!["Flip", "Wall/Flip"]);
        assert_eq!(bow.features[0].label, vec![0, 1]);
        assert_eq!(bow.features[1].label, vec![1, 0]);
        assert_eq!(bow.features[2].label, bow.features[0].label);
        assert_eq!(bow.features[3].label, vec![0, 0]);
        assert!(bow.features.iter().all(|f| f.label.iter().filter(|b| **b == 1).count() <= 1));
    }

    #[test]
    fn serializes_label_map() {
        let table = MoveTable::new(vec![Move::new(1, "Dash").with_type("Vault")]);
        let json = serde_json::to_value(BagOfWords::from_table(&table)).expect("json");
        assert_eq!(json["task"], "multihot");
        assert_eq!(json["label_map"]["Vault"], 0);
    }
}
