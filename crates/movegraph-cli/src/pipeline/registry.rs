//! Static stage registry.
//!
//! Every runnable stage is a variant of [`Stage`]. Names in a config file or
//! on the command line are resolved against [`Stage::ALL`] before anything
//! runs, so a typo fails the whole run up front instead of halfway through.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    CheckMoves,
    InvalidIds,
    DuplicateEdges,
    DuplicateNodes,
    Symmetry,
    Incomplete,
    MoveTypes,
    SortEdges,
    GenerateGraph,
    NameToInt,
    RelabelGraph,
    PruneGraph,
    UnavailableEmbed,
    FixEmbed,
    RandomMasks,
    ExtrapolationMasks,
    MediaMasks,
    LabelDistribution,
    ComponentLabels,
    ExtractLabels,
    BagOfWords,
    BagOfWordsOneHot,
    GraphStats,
    Cycles,
}

impl Stage {
    pub const ALL: [Self; 24] = [
        Self::CheckMoves,
        Self::InvalidIds,
        Self::DuplicateEdges,
        Self::DuplicateNodes,
        Self::Symmetry,
        Self::Incomplete,
        Self::MoveTypes,
        Self::SortEdges,
        Self::GenerateGraph,
        Self::NameToInt,
        Self::RelabelGraph,
        Self::PruneGraph,
        Self::UnavailableEmbed,
        Self::FixEmbed,
        Self::RandomMasks,
        Self::ExtrapolationMasks,
        Self::MediaMasks,
        Self::LabelDistribution,
        Self::ComponentLabels,
        Self::ExtractLabels,
        Self::BagOfWords,
        Self::BagOfWordsOneHot,
        Self::GraphStats,
        Self::Cycles,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CheckMoves => "check-moves",
            Self::InvalidIds => "invalid-ids",
            Self::DuplicateEdges => "duplicate-edges",
            Self::DuplicateNodes => "duplicate-nodes",
            Self::Symmetry => "symmetry",
            Self::Incomplete => "incomplete",
            Self::MoveTypes => "move-types",
            Self::SortEdges => "sort-edges",
            Self::GenerateGraph => "generate-graph",
            Self::NameToInt => "name-to-int",
            Self::RelabelGraph => "relabel-graph",
            Self::PruneGraph => "prune-graph",
            Self::UnavailableEmbed => "unavailable-embed",
            Self::FixEmbed => "fix-embed",
            Self::RandomMasks => "random-masks",
            Self::ExtrapolationMasks => "extrapolation-masks",
            Self::MediaMasks => "media-masks",
            Self::LabelDistribution => "label-distribution",
            Self::ComponentLabels => "component-labels",
            Self::ExtractLabels => "extract-labels",
            Self::BagOfWords => "bag-of-words",
            Self::BagOfWordsOneHot => "bag-of-words-onehot",
            Self::GraphStats => "graph-stats",
            Self::Cycles => "cycles",
        }
    }

    #[must_use]
    pub const fn about(self) -> &'static str {
        match self {
            Self::CheckMoves => "Run every table check and record parser findings",
            Self::InvalidIds => "Report ids that break the 1..N sequence",
            Self::DuplicateEdges => "Report names repeated inside one relation cell",
            Self::DuplicateNodes => "Report every row whose name is not unique",
            Self::Symmetry => "Report prereq/subseq pairs missing their mirror",
            Self::Incomplete => "Report rows with empty required columns",
            Self::MoveTypes => "Report type strings that differ only in spelling",
            Self::SortEdges => "Sort relation cells and write the table",
            Self::GenerateGraph => "Build and validate the graph, write its adjacency list",
            Self::NameToInt => "Write the move name to integer id map",
            Self::RelabelGraph => "Write the adjacency list keyed by integer ids",
            Self::PruneGraph => "Remove moves without media and rebuild the graph",
            Self::UnavailableEmbed => "Point embeds missing from the media dir at the sentinel",
            Self::FixEmbed => "Rename embeds to the canonical media filename",
            Self::RandomMasks => "Write random train/val/test masks",
            Self::ExtrapolationMasks => "Write masks that train on the largest component",
            Self::MediaMasks => "Write masks that train on moves with media",
            Self::LabelDistribution => "Write per-label and per-combination type counts",
            Self::ComponentLabels => "Write type counts per connected component",
            Self::ExtractLabels => "Write each move's type labels",
            Self::BagOfWords => "Write bag-of-words features with multi-hot labels",
            Self::BagOfWordsOneHot => "Write bag-of-words features with one-hot type labels",
            Self::GraphStats => "Write graph statistics",
            Self::Cycles => "Record prerequisite cycles (directed mode)",
        }
    }

    /// Stages that must not have failed earlier in the same run.
    #[must_use]
    pub const fn requires(self) -> &'static [Self] {
        match self {
            Self::RelabelGraph => &[Self::GenerateGraph, Self::NameToInt],
            Self::ExtrapolationMasks | Self::GraphStats | Self::Cycles => &[Self::GenerateGraph],
            _ => &[],
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name.trim())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Stage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Why a stage list was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageListError {
    Unknown(String),
    Duplicate(Stage),
    Empty,
}

impl fmt::Display for StageListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "unknown stage `{name}`"),
            Self::Duplicate(stage) => write!(f, "stage `{stage}` listed more than once"),
            Self::Empty => f.write_str("no stages to run"),
        }
    }
}

impl std::error::Error for StageListError {}

/// Resolve stage names in order, rejecting unknown and repeated names.
///
/// # Errors
///
/// Returns the first problem found.
pub fn resolve<S: AsRef<str>>(names: &[S]) -> Result<Vec<Stage>, StageListError> {
    if names.is_empty() {
        return Err(StageListError::Empty);
    }
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let stage =
                Stage::from_name(name).ok_or_else(|| StageListError::Unknown(name.to_string()))?;
            if seen.insert(stage) {
                Ok(stage)
            } else {
                Err(StageListError::Duplicate(stage))
            }
        })
        .collect()
}
