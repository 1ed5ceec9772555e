use lendguard_tree::{ErrorKind, TreeError};

/// Errors from anomaly detector training and scoring.
#[derive(Debug, thiserror::Error)]
pub enum AnomalyError {
    /// Returned when a raw input field is NaN or infinite.
    #[error("input field `{field}` is not finite")]
    NonFiniteField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// Returned when a vector does not have the arity the detector expects.
    #[error("expected {expected} features, got {got}")]
    DimensionMismatch {
        /// Arity the detector was built for.
        expected: usize,
        /// Arity of the offending vector.
        got: usize,
    },

    /// Returned when training is attempted with no historical vectors.
    #[error("historical data must contain at least one vector")]
    EmptyHistory,

    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when max_samples is zero.
    #[error("max_samples must be at least 1, got {max_samples}")]
    InvalidSampleSize {
        /// The invalid max_samples value provided.
        max_samples: usize,
    },

    /// Returned when the LOF neighbor count is zero.
    #[error("LOF neighbor count must be at least 1, got {k}")]
    InvalidNeighborCount {
        /// The invalid k value provided.
        k: usize,
    },

    /// Returned when the z-score threshold is not strictly positive.
    #[error("z-score threshold must be positive and finite, got {threshold}")]
    InvalidThreshold {
        /// The invalid threshold provided.
        threshold: f64,
    },

    /// Wraps a tree construction or traversal error.
    #[error("isolation tree error: {0}")]
    Tree(#[from] TreeError),
}

impl AnomalyError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnomalyError::InvalidTreeCount { .. }
            | AnomalyError::InvalidSampleSize { .. }
            | AnomalyError::InvalidNeighborCount { .. }
            | AnomalyError::InvalidThreshold { .. } => ErrorKind::Configuration,
            AnomalyError::Tree(inner) => inner.kind(),
            _ => ErrorKind::InvalidInput,
        }
    }
}
