use core::fmt;

use thiserror::Error;

/// Result alias for `rockfuse`.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Schema check, text cleaning, normalization.
    Preprocess,
    /// Hierarchical clustering over numeric features.
    Numeric,
    /// Link clustering over categorical features.
    Categorical,
    /// Link clustering over the fused label pair.
    Ensemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Preprocess => write!(f, "preprocess"),
            Stage::Numeric => write!(f, "numeric"),
            Stage::Categorical => write!(f, "categorical"),
            Stage::Ensemble => write!(f, "ensemble"),
        }
    }
}

/// Errors returned by the clustering stages and the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Rows or columns of inconsistent length.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Invalid number of clusters requested.
    #[error("cannot create {requested} clusters from {n_items} items")]
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// A column required by the schema is absent from the record table.
    #[error("{stage} stage requires column '{column}', which is missing")]
    MissingColumn {
        /// Column name.
        column: String,
        /// Stage that needed it.
        stage: Stage,
    },

    /// NaN or infinite value in a numeric column.
    #[error("column '{column}' has a non-finite value at row {row}")]
    NonFiniteValue {
        /// Column name.
        column: String,
        /// Record index.
        row: usize,
    },

    /// A stage was invoked before the stages it depends on produced output.
    #[error("{stage} stage prerequisite not met: {missing} is absent")]
    PrerequisiteNotMet {
        /// Stage that was invoked.
        stage: Stage,
        /// What was missing.
        missing: &'static str,
    },

    /// Two labelings that must index-align have different lengths.
    #[error("labelings are not aligned: {left} records vs {right} records")]
    LabelMisaligned {
        /// Length of the first labeling.
        left: usize,
        /// Length of the second labeling.
        right: usize,
    },

    /// Every candidate of a grid search failed.
    #[error("{stage} search produced no scored candidate ({failed} failed)")]
    NoScoredCandidate {
        /// Stage whose search failed.
        stage: Stage,
        /// Number of failed candidates.
        failed: usize,
    },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Create an `InvalidParameter` error.
    pub fn invalid_parameter(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            message: message.into(),
        }
    }

    /// Create a `MissingColumn` error.
    pub fn missing_column(column: impl Into<String>, stage: Stage) -> Self {
        Self::MissingColumn {
            column: column.into(),
            stage,
        }
    }
}
