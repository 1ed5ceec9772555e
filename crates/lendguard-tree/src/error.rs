//! Error types shared by the tree primitives.

/// Coarse classification of a failure, shared by every lendguard error enum.
///
/// Callers that only need to distinguish bad data from bad configuration
/// match on this instead of on crate-specific variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Malformed or inconsistent data: length mismatches, non-finite values,
    /// empty datasets where a split or fold would be empty.
    InvalidInput,
    /// A parameter outside its valid range.
    Configuration,
}

/// Errors from feature vector construction and tree building.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when a feature value is NaN or infinite.
    #[error("feature vector contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when a training target is NaN or infinite.
    #[error("non-finite target at sample {sample_index}")]
    NonFiniteTarget {
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when the number of feature rows and targets differ.
    #[error("{n_samples} feature rows but {n_targets} targets")]
    TargetCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of targets.
        n_targets: usize,
    },

    /// Returned when a sample has a different number of features than the first sample.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a prediction input has the wrong arity.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when an isolation tree is built from zero samples.
    #[error("isolation tree requires at least one sample")]
    EmptySample,

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },
}

impl TreeError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            TreeError::InvalidMaxDepth { .. } => ErrorKind::Configuration,
            _ => ErrorKind::InvalidInput,
        }
    }
}
