//! Training configuration and hyperparameter grids.

use crate::TrainError;

/// Weight penalty applied during gradient updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regularization {
    #[default]
    None,
    L1,
    L2,
}

/// Configuration for a mini-batch training run.
///
/// Construct via [`ModelTrainingConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter          | Default |
/// |--------------------|---------|
/// | `validation_split` | 0.2     |
/// | `learning_rate`    | 0.01    |
/// | `regularization`   | `None`  |
/// | `seed`             | 42      |
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelTrainingConfig {
    pub(crate) epochs: usize,
    pub(crate) batch_size: usize,
    pub(crate) validation_split: f64,
    pub(crate) learning_rate: f64,
    pub(crate) regularization: Regularization,
    pub(crate) seed: u64,
}

impl ModelTrainingConfig {
    /// Create a config with the given epoch count and batch size.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TrainError::InvalidEpochs`] | `epochs` is 0 |
    /// | [`TrainError::InvalidBatchSize`] | `batch_size` is 0 |
    pub fn new(epochs: usize, batch_size: usize) -> Result<Self, TrainError> {
        Ok(Self {
            epochs: check_epochs(epochs)?,
            batch_size: check_batch_size(batch_size)?,
            validation_split: 0.2,
            learning_rate: 0.01,
            regularization: Regularization::None,
            seed: 42,
        })
    }

    // --- Setters ---

    /// Set the number of epochs.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::InvalidEpochs`] when `epochs` is 0.
    pub fn with_epochs(mut self, epochs: usize) -> Result<Self, TrainError> {
        self.epochs = check_epochs(epochs)?;
        Ok(self)
    }

    /// Set the mini-batch size.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::InvalidBatchSize`] when `batch_size` is 0.
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self, TrainError> {
        self.batch_size = check_batch_size(batch_size)?;
        Ok(self)
    }

    /// Set the fraction of trailing samples held out for validation.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::InvalidValidationSplit`] unless the value is in `[0, 1)`.
    pub fn with_validation_split(mut self, validation_split: f64) -> Result<Self, TrainError> {
        if !(0.0..1.0).contains(&validation_split) {
            return Err(TrainError::InvalidValidationSplit { validation_split });
        }
        self.validation_split = validation_split;
        Ok(self)
    }

    /// Set the gradient step size.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::InvalidLearningRate`] unless the value is finite and positive.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Result<Self, TrainError> {
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(TrainError::InvalidLearningRate { learning_rate });
        }
        self.learning_rate = learning_rate;
        Ok(self)
    }

    /// Set the weight penalty.
    #[must_use]
    pub fn with_regularization(mut self, regularization: Regularization) -> Self {
        self.regularization = regularization;
        self
    }

    /// Set the shuffle seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Apply one hyperparameter override through the validating setters.
    ///
    /// # Errors
    ///
    /// Returns the setter's error for an out-of-range value.
    pub fn apply(self, param: Hyperparameter) -> Result<Self, TrainError> {
        match param {
            Hyperparameter::Epochs(v) => self.with_epochs(v),
            Hyperparameter::BatchSize(v) => self.with_batch_size(v),
            Hyperparameter::ValidationSplit(v) => self.with_validation_split(v),
            Hyperparameter::LearningRate(v) => self.with_learning_rate(v),
            Hyperparameter::Regularization(v) => Ok(self.with_regularization(v)),
        }
    }

    // --- Getters ---

    /// Return the number of epochs.
    #[must_use]
    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Return the mini-batch size.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Return the validation fraction.
    #[must_use]
    pub fn validation_split(&self) -> f64 {
        self.validation_split
    }

    /// Return the learning rate.
    #[must_use]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Return the weight penalty.
    #[must_use]
    pub fn regularization(&self) -> Regularization {
        self.regularization
    }

    /// Return the shuffle seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

fn check_epochs(epochs: usize) -> Result<usize, TrainError> {
    if epochs == 0 {
        return Err(TrainError::InvalidEpochs { epochs });
    }
    Ok(epochs)
}

fn check_batch_size(batch_size: usize) -> Result<usize, TrainError> {
    if batch_size == 0 {
        return Err(TrainError::InvalidBatchSize { batch_size });
    }
    Ok(batch_size)
}

/// A single hyperparameter setting.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hyperparameter {
    Epochs(usize),
    BatchSize(usize),
    ValidationSplit(f64),
    LearningRate(f64),
    Regularization(Regularization),
}

/// Candidate values per hyperparameter, searched as a full cartesian product.
///
/// Axes keep insertion order; the first axis varies slowest.
#[derive(Debug, Clone, Default)]
pub struct HyperparameterGrid {
    axes: Vec<Vec<Hyperparameter>>,
}

impl HyperparameterGrid {
    /// Create an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add epoch counts to search.
    #[must_use]
    pub fn with_epochs(self, values: &[usize]) -> Self {
        self.with_axis(values.iter().map(|&v| Hyperparameter::Epochs(v)))
    }

    /// Add batch sizes to search.
    #[must_use]
    pub fn with_batch_sizes(self, values: &[usize]) -> Self {
        self.with_axis(values.iter().map(|&v| Hyperparameter::BatchSize(v)))
    }

    /// Add validation splits to search.
    #[must_use]
    pub fn with_validation_splits(self, values: &[f64]) -> Self {
        self.with_axis(values.iter().map(|&v| Hyperparameter::ValidationSplit(v)))
    }

    /// Add learning rates to search.
    #[must_use]
    pub fn with_learning_rates(self, values: &[f64]) -> Self {
        self.with_axis(values.iter().map(|&v| Hyperparameter::LearningRate(v)))
    }

    /// Add regularization modes to search.
    #[must_use]
    pub fn with_regularizations(self, values: &[Regularization]) -> Self {
        self.with_axis(values.iter().map(|&v| Hyperparameter::Regularization(v)))
    }

    fn with_axis(mut self, axis: impl Iterator<Item = Hyperparameter>) -> Self {
        self.axes.push(axis.collect());
        self
    }

    /// Every combination, one value per axis, in axis order.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::EmptyGrid`] when there are no axes or an axis
    /// has no values.
    pub fn combinations(&self) -> Result<Vec<Vec<Hyperparameter>>, TrainError> {
        if self.axes.is_empty() || self.axes.iter().any(Vec::is_empty) {
            return Err(TrainError::EmptyGrid);
        }
        let mut out = Vec::new();
        expand(&self.axes, &mut Vec::with_capacity(self.axes.len()), &mut out);
        Ok(out)
    }
}

fn expand(
    axes: &[Vec<Hyperparameter>],
    current: &mut Vec<Hyperparameter>,
    out: &mut Vec<Vec<Hyperparameter>>,
) {
    let Some((axis, rest)) = axes.split_first() else {
        out.push(current.clone());
        return;
    };
    for &value in axis {
        current.push(value);
        expand(rest, current, out);
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_setters() {
        let config = ModelTrainingConfig::new(20, 8).unwrap();
        assert_eq!(config.validation_split(), 0.2);
        assert_eq!(config.seed(), 42);
        let config = config
            .with_validation_split(0.0)
            .unwrap()
            .with_regularization(Regularization::L2);
        assert_eq!(config.validation_split(), 0.0);
        assert_eq!(config.regularization(), Regularization::L2);
    }

    #[test]
    fn invalid_values_are_configuration_errors() {
        let config = ModelTrainingConfig::new(10, 4).unwrap();
        for err in [
            ModelTrainingConfig::new(0, 4).unwrap_err(),
            config.clone().with_validation_split(1.0).unwrap_err(),
            config.clone().with_validation_split(-0.1).unwrap_err(),
            config.clone().with_learning_rate(0.0).unwrap_err(),
            config.with_batch_size(0).unwrap_err(),
        ] {
            assert_eq!(err.kind(), lendguard_tree::ErrorKind::Configuration);
        }
    }

    #[test]
    fn combinations_follow_axis_order() {
        let grid = HyperparameterGrid::new()
            .with_learning_rates(&[0.1, 0.01])
            .with_batch_sizes(&[8, 16, 32]);
        let combos = grid.combinations().unwrap();
        assert_eq!(combos.len(), 6);
        assert_eq!(
            combos[0],
            vec![Hyperparameter::LearningRate(0.1), Hyperparameter::BatchSize(8)]
        );
        assert_eq!(
            combos[3],
            vec![Hyperparameter::LearningRate(0.01), Hyperparameter::BatchSize(8)]
        );
    }

    #[test]
    fn empty_grid_rejected() {
        assert!(matches!(
            HyperparameterGrid::new().combinations(),
            Err(TrainError::EmptyGrid)
        ));
        assert!(matches!(
            HyperparameterGrid::new().with_epochs(&[]).combinations(),
            Err(TrainError::EmptyGrid)
        ));
    }

    #[test]
    fn apply_validates() {
        let config = ModelTrainingConfig::new(10, 4).unwrap();
        let tuned = config.clone().apply(Hyperparameter::BatchSize(16)).unwrap();
        assert_eq!(tuned.batch_size(), 16);
        assert!(config.apply(Hyperparameter::ValidationSplit(1.5)).is_err());
    }

    #[test]
    fn hyperparameter_json_shape() {
        let json = serde_json::to_string(&Hyperparameter::LearningRate(0.5)).unwrap();
        assert_eq!(json, r#"{"learning_rate":0.5}"#);
    }
}
