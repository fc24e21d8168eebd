use std::fmt;

use serde::{Serialize, Serializer};

/// Machine-readable error codes attached to failed pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidSplit,
    UnknownStage,
    DuplicateStage,
    TableReadFailed,
    TableWriteFailed,
    GraphValidationFailed,
    RelabelMismatch,
    PruneSurvivor,
    MaskPartitionMismatch,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidSplit => "E1002",
            Self::UnknownStage => "E1003",
            Self::DuplicateStage => "E1004",
            Self::TableReadFailed => "E2001",
            Self::TableWriteFailed => "E2002",
            Self::GraphValidationFailed => "E3001",
            Self::RelabelMismatch => "E3002",
            Self::PruneSurvivor => "E3003",
            Self::MaskPartitionMismatch => "E3004",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidSplit => "Invalid split configuration",
            Self::UnknownStage => "Unknown pipeline stage",
            Self::DuplicateStage => "Stage listed more than once",
            Self::TableReadFailed => "Table read failed",
            Self::TableWriteFailed => "Table write failed",
            Self::GraphValidationFailed => "Graph does not match its source table",
            Self::RelabelMismatch => "Relabeled graph is not invertible",
            Self::PruneSurvivor => "Pruned move still present in graph",
            Self::MaskPartitionMismatch => "Masks do not partition the node set",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the pipeline config file and retry."),
            Self::InvalidSplit => {
                Some("Use split fractions within [0, 1] that sum to exactly 1.")
            }
            Self::UnknownStage => Some("Run `mg stages` to list the registered stage names."),
            Self::DuplicateStage => Some("List each stage at most once per run."),
            Self::TableReadFailed => {
                Some("Check the table path and that `id` and `name` columns exist.")
            }
            Self::TableWriteFailed => Some("Check disk space and write permissions."),
            Self::GraphValidationFailed => {
                Some("Resolve the unresolved references reported by `check-moves` first.")
            }
            Self::RelabelMismatch => Some("Regenerate the name map with `name-to-int` and retry."),
            Self::PruneSurvivor | Self::MaskPartitionMismatch | Self::InternalUnexpected => {
                Some("Retry once. If persistent, report a bug with logs.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}
