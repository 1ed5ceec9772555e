use lendguard_tree::{ErrorKind, TreeError};

/// Errors from training, evaluation and preprocessing.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    /// Returned when a dataset has zero samples.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Returned when the validation split leaves no training samples.
    #[error("validation split {validation_split} leaves no training samples out of {n_samples}")]
    EmptyTrainingPartition {
        /// Number of samples in the dataset.
        n_samples: usize,
        /// The configured validation fraction.
        validation_split: f64,
    },

    /// Returned when a sample's arity differs from the model's.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// Arity the model expects.
        expected: usize,
        /// Arity of the offending sample.
        got: usize,
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when a label is NaN or infinite.
    #[error("non-finite label at sample {sample_index}")]
    NonFiniteLabel {
        /// The zero-based index of the offending sample.
        sample_index: usize,
    },

    /// Returned when prediction and target slices differ in length.
    #[error("{n_predictions} predictions but {n_targets} targets")]
    LengthMismatch {
        /// Number of predictions.
        n_predictions: usize,
        /// Number of targets.
        n_targets: usize,
    },

    /// Returned when model parameters become NaN or infinite.
    #[error("model parameters diverged at epoch {epoch}")]
    Diverged {
        /// The epoch in which divergence was detected.
        epoch: usize,
    },

    /// Returned when epochs is zero.
    #[error("epochs must be at least 1, got {epochs}")]
    InvalidEpochs {
        /// The invalid epoch count.
        epochs: usize,
    },

    /// Returned when batch_size is zero.
    #[error("batch_size must be at least 1, got {batch_size}")]
    InvalidBatchSize {
        /// The invalid batch size.
        batch_size: usize,
    },

    /// Returned when the validation split lies outside `[0, 1)`.
    #[error("validation_split must be in [0, 1), got {validation_split}")]
    InvalidValidationSplit {
        /// The invalid fraction.
        validation_split: f64,
    },

    /// Returned when the learning rate is not finite and positive.
    #[error("learning_rate must be positive and finite, got {learning_rate}")]
    InvalidLearningRate {
        /// The invalid learning rate.
        learning_rate: f64,
    },

    /// Returned when the fold count is below 2 or above the sample count.
    #[error("fold count must be in [2, {n_samples}], got {folds}")]
    InvalidFoldCount {
        /// The invalid fold count.
        folds: usize,
        /// Number of samples available.
        n_samples: usize,
    },

    /// Returned when a hyperparameter grid yields no combinations.
    #[error("hyperparameter grid has no combinations")]
    EmptyGrid,

    /// Returned when the polynomial degree is zero.
    #[error("polynomial degree must be at least 1, got {degree}")]
    InvalidDegree {
        /// The invalid degree.
        degree: u32,
    },

    /// Wraps a feature vector construction error.
    #[error("feature error: {0}")]
    Feature(#[from] TreeError),
}

impl TrainError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrainError::InvalidEpochs { .. }
            | TrainError::InvalidBatchSize { .. }
            | TrainError::InvalidValidationSplit { .. }
            | TrainError::InvalidLearningRate { .. }
            | TrainError::InvalidFoldCount { .. }
            | TrainError::EmptyGrid
            | TrainError::InvalidDegree { .. } => ErrorKind::Configuration,
            TrainError::Feature(inner) => inner.kind(),
            _ => ErrorKind::InvalidInput,
        }
    }
}
