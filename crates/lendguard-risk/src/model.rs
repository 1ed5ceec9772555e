//! The common regressor interface.

use lendguard_tree::FeatureVector;
use rand::RngCore;

use crate::RiskError;

/// Which regressor a [`RiskModel`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest,
    GradientBoosting,
    NeuralNetwork,
    LogisticRegression,
}

/// A regressor mapping a feature vector to a risk score in `[0, 100]`.
///
/// `train` replaces the model's parameters only when it succeeds.
pub trait RiskModel: std::fmt::Debug + Send + Sync {
    /// Which regressor this is.
    fn kind(&self) -> ModelKind;

    /// Arity the model accepts.
    fn n_features(&self) -> usize;

    /// Predict a score in `[0, 100]`.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::DimensionMismatch`] on arity mismatch.
    fn predict(&self, x: &FeatureVector) -> Result<f64, RiskError>;

    /// Fit to `(features, targets)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an input error when the dataset is empty or malformed; see
    /// [`validate_training_set`].
    fn train(
        &mut self,
        features: &[FeatureVector],
        targets: &[f64],
        rng: &mut dyn RngCore,
    ) -> Result<(), RiskError>;
}

/// Check a single vector's arity.
pub(crate) fn check_arity(x: &FeatureVector, expected: usize) -> Result<(), RiskError> {
    if x.len() != expected {
        return Err(RiskError::DimensionMismatch {
            expected,
            got: x.len(),
        });
    }
    Ok(())
}

/// Validate a training set against a model arity.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RiskError::TargetCountMismatch`] | `features.len() != targets.len()` |
/// | [`RiskError::EmptyDataset`] | no samples |
/// | [`RiskError::DimensionMismatch`] | a row has the wrong arity |
/// | [`RiskError::NonFiniteTarget`] | a target is NaN or infinite |
pub fn validate_training_set(
    features: &[FeatureVector],
    targets: &[f64],
    n_features: usize,
) -> Result<(), RiskError> {
    if features.len() != targets.len() {
        return Err(RiskError::TargetCountMismatch {
            n_samples: features.len(),
            n_targets: targets.len(),
        });
    }
    if features.is_empty() {
        return Err(RiskError::EmptyDataset);
    }
    for row in features {
        check_arity(row, n_features)?;
    }
    if let Some(sample_index) = targets.iter().position(|t| !t.is_finite()) {
        return Err(RiskError::NonFiniteTarget { sample_index });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(values: &[f64]) -> FeatureVector {
        FeatureVector::new(values.to_vec()).unwrap()
    }

    #[test]
    fn validation_catches_each_problem() {
        let rows = vec![fv(&[1.0, 2.0]), fv(&[3.0, 4.0])];
        assert!(validate_training_set(&rows, &[1.0, 2.0], 2).is_ok());
        assert!(matches!(
            validate_training_set(&rows, &[1.0], 2),
            Err(RiskError::TargetCountMismatch { .. })
        ));
        assert!(matches!(
            validate_training_set(&[], &[], 2),
            Err(RiskError::EmptyDataset)
        ));
        assert!(matches!(
            validate_training_set(&rows, &[1.0, 2.0], 3),
            Err(RiskError::DimensionMismatch { expected: 3, got: 2 })
        ));
        assert!(matches!(
            validate_training_set(&rows, &[1.0, f64::INFINITY], 2),
            Err(RiskError::NonFiniteTarget { sample_index: 1 })
        ));
    }

    #[test]
    fn model_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ModelKind::RandomForest).unwrap();
        assert_eq!(json, "\"random_forest\"");
    }
}
