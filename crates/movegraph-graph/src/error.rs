use movegraph_core::error::ErrorCode;

/// Structural invariant violations. Each one aborts the current stage.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("graph has {nodes} nodes but the table has {rows} rows")]
    NodeCount { nodes: usize, rows: usize },

    #[error(
        "neighbors of `{node}` disagree with its table row (missing: [{}], unexpected: [{}])",
        .missing.join(", "),
        .unexpected.join(", ")
    )]
    Validation {
        node: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("relabeling is not invertible: {0}")]
    Relabel(String),

    #[error("unknown node `{0}`")]
    UnknownNode(String),

    #[error("pruned moves still present after rebuild: {}", .0.join(", "))]
    PruneSurvivor(Vec<String>),

    #[error("masks do not partition {total} nodes (train={train}, val={val}, test={test})")]
    MaskPartition {
        train: usize,
        val: usize,
        test: usize,
        total: usize,
    },

    #[error(transparent)]
    Split(#[from] SplitError),
}

impl GraphError {
    /// Machine-readable code for the diagnostics document.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NodeCount { .. } | Self::Validation { .. } => ErrorCode::GraphValidationFailed,
            Self::Relabel(_) | Self::UnknownNode(_) => ErrorCode::RelabelMismatch,
            Self::PruneSurvivor(_) => ErrorCode::PruneSurvivor,
            Self::MaskPartition { .. } => ErrorCode::MaskPartitionMismatch,
            Self::Split(_) => ErrorCode::InvalidSplit,
        }
    }
}

/// Invalid train/validation/test fractions. Never clamped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplitError {
    #[error("{name} = {value} is outside [0, 1]")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("split fractions sum to {sum}, expected exactly 1")]
    BadSum { sum: f64 },

    #[error("test split needs {requested} nodes but the validation pool holds {available}")]
    TestExceedsPool { requested: usize, available: usize },
}
