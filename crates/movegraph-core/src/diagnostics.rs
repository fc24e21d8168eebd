//! The diagnostics document written once per pipeline run.
//!
//! Checks produce findings; findings are data, not errors. Each check that
//! ran fills in its own field, so a field that is absent from the serialized
//! document means the check was not invoked (as opposed to an empty list,
//! which means it ran and found nothing).

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::ErrorCode;
use crate::model::RelationColumn;

// ---------------------------------------------------------------------------
// Findings
// ---------------------------------------------------------------------------

/// One side of an id comparison: a concrete id, or a placeholder where one
/// sequence ran out or the cell was empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdCell {
    Id(i64),
    Missing,
}

impl Serialize for IdCell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Id(id) => serializer.serialize_i64(*id),
            Self::Missing => serializer.serialize_str("MISSING"),
        }
    }
}

/// An id that differs from its expected position in `1..=N`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdMismatch {
    pub actual: IdCell,
    pub expected: IdCell,
}

/// Tokens listed more than once inside a single relation cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellDuplicates {
    /// 1-based table row.
    pub row: usize,
    /// Each repeated token once, sorted.
    pub tokens: Vec<String>,
}

/// Within-cell duplicate tokens, grouped by relation column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateEdgeReport {
    pub prereq: Vec<CellDuplicates>,
    pub subseq: Vec<CellDuplicates>,
}

impl DuplicateEdgeReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prereq.is_empty() && self.subseq.is_empty()
    }

    pub fn column_mut(&mut self, column: RelationColumn) -> &mut Vec<CellDuplicates> {
        match column {
            RelationColumn::Prereq => &mut self.prereq,
            RelationColumn::Subseq => &mut self.subseq,
        }
    }
}

/// A row whose name also appears on another row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateName {
    /// 1-based table row.
    pub row: usize,
    pub id: Option<i64>,
    pub name: String,
}

/// A 1-indexed `(row, column)` position in the id-indexed adjacency matrix.
/// Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Coordinate(pub usize, pub usize);

/// A relation token that does not name exactly one move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedReference {
    /// 1-based table row holding the token.
    pub row: usize,
    pub column: RelationColumn,
    pub token: String,
    pub reason: UnresolvedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedReason {
    /// No move has this name.
    UnknownName,
    /// Several moves share this name.
    AmbiguousName,
    /// The owning row or the target row has no usable id.
    NoId,
}

/// A zero-length token inside a relation cell (trailing or doubled delimiter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmptyToken {
    /// 1-based table row.
    pub row: usize,
    pub column: RelationColumn,
    /// The raw cell, for locating the stray delimiter.
    pub cell: String,
}

/// Findings of the adjacency symmetry check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SymmetryReport {
    /// Upper-triangular positions where `m[i][j] != m[j][i]`.
    pub asymmetric: Vec<Coordinate>,
    /// References skipped while filling the matrix.
    pub unresolved: Vec<UnresolvedReference>,
}

/// Raw type strings that collapse to the same canonical label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelAmbiguity {
    pub canonical: String,
    /// Distinct raw spellings, sorted.
    pub variants: Vec<String>,
}

/// Findings of the multi-label canonicalization check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MoveTypeReport {
    pub ambiguous: Vec<LabelAmbiguity>,
    /// Present type strings with no usable label token (for example `"/"`).
    pub malformed: Vec<String>,
}

impl MoveTypeReport {
    /// `true` when no canonical bucket holds more than one raw spelling and
    /// nothing is malformed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.ambiguous.is_empty() && self.malformed.is_empty()
    }
}

/// Graph edge count against the count implied by the table's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeCountCheck {
    pub graph_edges: usize,
    pub resolved_tokens: usize,
    /// `resolved_tokens / 2`: every edge is listed once on each endpoint when
    /// the table is symmetric and free of duplicates.
    pub expected_edges: usize,
}

impl EdgeCountCheck {
    #[must_use]
    pub const fn agrees(&self) -> bool {
        self.graph_edges == self.expected_edges
    }
}

// ---------------------------------------------------------------------------
// Stage records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl StageFailure {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            hint: code.hint(),
        }
    }
}

/// Outcome of one executed (or skipped) stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub name: String,
    pub status: StageStatus,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StageFailure>,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_ids: Option<Vec<IdMismatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_edges: Option<DuplicateEdgeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_nodes: Option<Vec<DuplicateName>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symmetry: Option<SymmetryReport>,
    /// Column header to 1-based rows with an absent cell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incomplete: Option<BTreeMap<String, Vec<usize>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_types: Option<MoveTypeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved_references: Option<Vec<UnresolvedReference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_tokens: Option<Vec<EmptyToken>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_count: Option<EdgeCountCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycles: Option<Vec<Vec<String>>>,
    /// Free-form per-stage summaries (statistics, counts), keyed by stage name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub summaries: BTreeMap<String, serde_json::Value>,
    pub stages: Vec<StageRecord>,
}

impl Diagnostics {
    #[must_use]
    pub const fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            config: None,
            invalid_ids: None,
            duplicate_edges: None,
            duplicate_nodes: None,
            symmetry: None,
            incomplete: None,
            move_types: None,
            unresolved_references: None,
            empty_tokens: None,
            edge_count: None,
            cycles: None,
            summaries: BTreeMap::new(),
            stages: Vec::new(),
        }
    }

    /// A fresh document stamped with the current time.
    #[must_use]
    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    /// `true` when any recorded stage failed.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.stages.iter().any(|s| s.status == StageStatus::Failed)
    }

    /// Status of the named stage in this run, if it has run.
    #[must_use]
    pub fn stage_status(&self, name: &str) -> Option<StageStatus> {
        self.stages
            .iter()
            .rev()
            .find(|s| s.name == name)
            .map(|s| s.status)
    }
}
