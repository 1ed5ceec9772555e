//! Fixed-coefficient boosted scorer.

use lendguard_tree::FeatureVector;
use rand::RngCore;
use tracing::{debug, instrument};

use crate::{
    RiskError,
    model::{ModelKind, RiskModel, check_arity, validate_training_set},
};

/// Per-step weights over the first five features.
const STEP_WEIGHTS: [f64; 5] = [0.3, 0.2, 0.15, 0.15, 0.1];
/// Alternating per-iteration offset.
const ITERATION_BIAS: f64 = 5.0;
const BASE_PREDICTION: f64 = 50.0;

/// A boosted scorer whose steps are a fixed linear blend of the first five
/// features plus an alternating ±5 offset.
///
/// Training records residuals against the current predictions. They only
/// influence inference when residual correction is enabled, in which case
/// their mean is added to every prediction.
///
/// # Defaults
///
/// | Parameter             | Default |
/// |-----------------------|---------|
/// | `n_iterations`        | 100     |
/// | `learning_rate`       | 0.1     |
/// | `residual_correction` | false   |
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GradientBoostingRegressor {
    n_features: usize,
    n_iterations: usize,
    learning_rate: f64,
    residual_correction: bool,
    residuals: Vec<f64>,
}

impl GradientBoostingRegressor {
    /// Create a scorer over `n_features` inputs.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::TooFewInputs`] when `n_features < 5`.
    pub fn new(n_features: usize) -> Result<Self, RiskError> {
        if n_features < STEP_WEIGHTS.len() {
            return Err(RiskError::TooFewInputs {
                model: "gradient boosting",
                required: STEP_WEIGHTS.len(),
                n_features,
            });
        }
        Ok(Self {
            n_features,
            n_iterations: 100,
            learning_rate: 0.1,
            residual_correction: false,
            residuals: Vec::new(),
        })
    }

    /// Add the mean training residual to predictions.
    #[must_use]
    pub fn with_residual_correction(mut self, enabled: bool) -> Self {
        self.residual_correction = enabled;
        self
    }

    /// Return the residuals recorded by the last successful training run.
    #[must_use]
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn raw_prediction(&self, x: &FeatureVector) -> f64 {
        let linear: f64 = STEP_WEIGHTS
            .iter()
            .zip(x.as_slice())
            .map(|(w, v)| w * v)
            .sum();
        let mut prediction = BASE_PREDICTION;
        for i in 0..self.n_iterations {
            let offset = if i % 2 == 0 { ITERATION_BIAS } else { -ITERATION_BIAS };
            prediction += self.learning_rate * (linear + offset);
        }
        prediction
    }
}

impl RiskModel for GradientBoostingRegressor {
    fn kind(&self) -> ModelKind {
        ModelKind::GradientBoosting
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: &FeatureVector) -> Result<f64, RiskError> {
        check_arity(x, self.n_features)?;
        let mut prediction = self.raw_prediction(x);
        if self.residual_correction && !self.residuals.is_empty() {
            prediction += self.residuals.iter().sum::<f64>() / self.residuals.len() as f64;
        }
        Ok(prediction.clamp(0.0, 100.0))
    }

    #[instrument(skip_all, fields(n_samples = features.len()))]
    fn train(
        &mut self,
        features: &[FeatureVector],
        targets: &[f64],
        _rng: &mut dyn RngCore,
    ) -> Result<(), RiskError> {
        validate_training_set(features, targets, self.n_features)?;
        let residuals = features
            .iter()
            .zip(targets)
            .map(|(x, &t)| t - self.raw_prediction(x).clamp(0.0, 100.0))
            .collect::<Vec<f64>>();
        debug!(n_residuals = residuals.len(), "gradient boosting residuals recorded");
        self.residuals = residuals;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fv(values: &[f64]) -> FeatureVector {
        FeatureVector::new(values.to_vec()).unwrap()
    }

    #[test]
    fn offsets_cancel_over_even_iterations() {
        let gb = GradientBoostingRegressor::new(5).unwrap();
        // 50 + 10 * (0.3 + 0.2 + 0.15 + 0.15 + 0.1) * 1
        let pred = gb.predict(&fv(&[1.0; 5])).unwrap();
        assert!((pred - 59.0).abs() < 1e-9);
        assert_eq!(gb.predict(&fv(&[0.0; 5])).unwrap(), 50.0);
    }

    #[test]
    fn prediction_is_clamped() {
        let gb = GradientBoostingRegressor::new(5).unwrap();
        assert_eq!(gb.predict(&fv(&[100.0; 5])).unwrap(), 100.0);
    }

    #[test]
    fn residuals_are_ignored_by_default() {
        let mut gb = GradientBoostingRegressor::new(5).unwrap();
        let x = fv(&[1.0; 5]);
        let before = gb.predict(&x).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        gb.train(&[x.clone()], &[69.0], &mut rng).unwrap();
        assert!((gb.residuals()[0] - 10.0).abs() < 1e-9);
        assert_eq!(gb.predict(&x).unwrap(), before);
    }

    #[test]
    fn residual_correction_shifts_predictions() {
        let mut gb = GradientBoostingRegressor::new(5)
            .unwrap()
            .with_residual_correction(true);
        let x = fv(&[1.0; 5]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        gb.train(&[x.clone()], &[69.0], &mut rng).unwrap();
        assert!((gb.predict(&x).unwrap() - 69.0).abs() < 1e-9);
    }

    #[test]
    fn needs_five_inputs() {
        let err = GradientBoostingRegressor::new(4).unwrap_err();
        assert_eq!(err.kind(), lendguard_tree::ErrorKind::Configuration);
    }
}
