//! In-memory model of the `moves` and `videos` tables.
//!
//! Both tables are keyed by an integer `id`. A move's `prereq` and `subseq`
//! cells hold `", "`-delimited move names; its `type` cell holds
//! `/`-delimited category labels.
//!
//! Tables are plain values. Stages take a table by reference and return a new
//! table when they repair something; nothing is mutated behind a caller's back.

pub mod moves;
pub mod video;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use moves::{Move, MoveTable};
pub use video::{UNAVAILABLE_MEDIA, Video, VideoTable};

/// Separator between move names inside a `prereq`/`subseq` cell.
pub const RELATION_DELIMITER: &str = ", ";

/// Separator between category labels inside a `type` cell.
pub const LABEL_DELIMITER: char = '/';

/// Spellings of "no value" produced by spreadsheets and dataframe exports.
const NULL_SPELLINGS: &[&str] = &["nan", "NaN", "NAN", "None", "none", "null", "NULL", "NA", "N/A"];

/// Normalize a raw cell into the single absent representation.
///
/// Returns `None` for empty or whitespace-only cells and for the usual null
/// spellings. Present values are returned unchanged (no trimming), so that a
/// later sort or diff sees exactly what was on disk.
#[must_use]
pub fn normalize_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NULL_SPELLINGS.contains(&trimmed) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// The two relation columns of the moves table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationColumn {
    /// Moves that must precede this move.
    Prereq,
    /// Moves that must follow this move.
    Subseq,
}

impl RelationColumn {
    /// Both columns, in table order.
    pub const ALL: [Self; 2] = [Self::Prereq, Self::Subseq];

    /// Column header as it appears in the table.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::Prereq => "prereq",
            Self::Subseq => "subseq",
        }
    }
}

impl fmt::Display for RelationColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}
