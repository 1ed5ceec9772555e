use lendguard_tree::{ErrorKind, TreeError};

/// Errors from risk model training, prediction and credit scoring.
#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    /// Returned when a vector does not have the arity the model expects.
    #[error("expected {expected} features, got {got}")]
    DimensionMismatch {
        /// Arity the model was built for.
        expected: usize,
        /// Arity of the offending vector.
        got: usize,
    },

    /// Returned when a model is built for fewer inputs than its fixed coefficients need.
    #[error("{model} needs at least {required} inputs, got {n_features}")]
    TooFewInputs {
        /// Model that rejected the arity.
        model: &'static str,
        /// Minimum arity.
        required: usize,
        /// Arity requested.
        n_features: usize,
    },

    /// Returned when the number of feature rows and targets differ.
    #[error("{n_samples} feature rows but {n_targets} targets")]
    TargetCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of targets.
        n_targets: usize,
    },

    /// Returned when training is attempted on zero samples.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when a training target is NaN or infinite.
    #[error("non-finite target at sample {sample_index}")]
    NonFiniteTarget {
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a raw input field is NaN or infinite.
    #[error("input field `{field}` is not finite")]
    NonFiniteField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// Returned when a finite input lies outside the range a formula accepts.
    #[error("input field `{field}` is out of range: {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when training drives parameters to NaN or infinity.
    #[error("{model} parameters diverged during training")]
    Diverged {
        /// Model whose parameters diverged.
        model: &'static str,
    },

    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when the fold count is below 2 or above the sample count.
    #[error("fold count must be in [2, {n_samples}], got {folds}")]
    InvalidFoldCount {
        /// The invalid fold count.
        folds: usize,
        /// Number of samples available.
        n_samples: usize,
    },

    /// Wraps a tree construction or prediction error.
    #[error("decision tree error: {0}")]
    Tree(#[from] TreeError),
}

impl RiskError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            RiskError::TooFewInputs { .. }
            | RiskError::InvalidTreeCount { .. }
            | RiskError::InvalidFoldCount { .. } => ErrorKind::Configuration,
            RiskError::Tree(inner) => inner.kind(),
            _ => ErrorKind::InvalidInput,
        }
    }
}
