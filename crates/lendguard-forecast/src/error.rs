use lendguard_tree::ErrorKind;

/// Errors from forecasting and regression.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    /// Returned when a series has no observations.
    #[error("series is empty")]
    EmptySeries,

    /// Returned when a series is shorter than the forecaster needs.
    #[error("need at least {required} observations, got {got}")]
    InsufficientHistory {
        /// Minimum number of observations.
        required: usize,
        /// Number of observations supplied.
        got: usize,
    },

    /// Returned when the forecast horizon is zero.
    #[error("forecast horizon must be at least 1")]
    InvalidHorizon,

    /// Returned when an observation is NaN or infinite.
    #[error("non-finite value at index {index}")]
    NonFiniteValue {
        /// The zero-based index of the offending value.
        index: usize,
    },

    /// Returned when a smoothing factor lies outside `(0, 1]`.
    #[error("smoothing factor `{name}` must be in (0, 1], got {value}")]
    InvalidSmoothingFactor {
        /// Which factor was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when regression rows and targets differ in count.
    #[error("{n_samples} feature rows but {n_targets} targets")]
    TargetCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of targets.
        n_targets: usize,
    },

    /// Returned when a regression dataset has no rows.
    #[error("regression dataset has zero samples")]
    EmptyDataset,

    /// Returned when a vector does not have the expected arity.
    #[error("expected {expected} features, got {got}")]
    DimensionMismatch {
        /// Arity the regressor was fitted on.
        expected: usize,
        /// Arity of the offending vector.
        got: usize,
    },

    /// Returned when regression coefficients become NaN or infinite.
    #[error("estimator {estimator} diverged")]
    Diverged {
        /// Index of the base learner that diverged.
        estimator: usize,
    },

    /// Returned when a prediction factor is NaN or infinite.
    #[error("factor `{field}` is not finite")]
    NonFiniteField {
        /// Name of the offending factor.
        field: &'static str,
    },
}

impl ForecastError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::InvalidHorizon | ForecastError::InvalidSmoothingFactor { .. } => {
                ErrorKind::Configuration
            }
            _ => ErrorKind::InvalidInput,
        }
    }
}

/// Reject non-finite observations.
pub(crate) fn check_finite(values: &[f64]) -> Result<(), ForecastError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ForecastError::NonFiniteValue { index }),
        None => Ok(()),
    }
}
