//! Clamped linear scorer with a mean-error update rule.

use lendguard_tree::FeatureVector;
use rand::RngCore;
use tracing::{debug, instrument};

use crate::{
    RiskError,
    model::{ModelKind, RiskModel, check_arity, validate_training_set},
};

const INITIAL_COEFFICIENTS: [f64; 8] = [0.3, 0.2, 0.15, 0.15, 0.1, 0.08, 0.12, 0.05];
const INITIAL_BIAS: f64 = 25.0;
const COEFFICIENT_STEP: f64 = 0.01;
const BIAS_STEP: f64 = 0.1;

/// A linear scorer over the first eight features, clamped to `[0, 100]`.
///
/// Training computes the mean error `e` of the current predictions and
/// applies `coefficients += 0.01 * e` and `bias += 0.1 * e` once.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LogisticRegression {
    n_features: usize,
    coefficients: [f64; 8],
    bias: f64,
}

impl LogisticRegression {
    /// Create a scorer over `n_features` inputs.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::TooFewInputs`] when `n_features < 8`.
    pub fn new(n_features: usize) -> Result<Self, RiskError> {
        if n_features < INITIAL_COEFFICIENTS.len() {
            return Err(RiskError::TooFewInputs {
                model: "logistic regression",
                required: INITIAL_COEFFICIENTS.len(),
                n_features,
            });
        }
        Ok(Self {
            n_features,
            coefficients: INITIAL_COEFFICIENTS,
            bias: INITIAL_BIAS,
        })
    }

    /// Return the current coefficients.
    #[must_use]
    pub fn coefficients(&self) -> &[f64; 8] {
        &self.coefficients
    }

    /// Return the current bias.
    #[must_use]
    pub fn bias(&self) -> f64 {
        self.bias
    }
}

impl RiskModel for LogisticRegression {
    fn kind(&self) -> ModelKind {
        ModelKind::LogisticRegression
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: &FeatureVector) -> Result<f64, RiskError> {
        check_arity(x, self.n_features)?;
        let logit = self.bias
            + self
                .coefficients
                .iter()
                .zip(x.as_slice())
                .map(|(c, v)| c * v)
                .sum::<f64>();
        Ok(logit.clamp(0.0, 100.0))
    }

    #[instrument(skip_all, fields(n_samples = features.len()))]
    fn train(
        &mut self,
        features: &[FeatureVector],
        targets: &[f64],
        _rng: &mut dyn RngCore,
    ) -> Result<(), RiskError> {
        validate_training_set(features, targets, self.n_features)?;
        let mut total_error = 0.0;
        for (x, &target) in features.iter().zip(targets) {
            total_error += target - self.predict(x)?;
        }
        let mean_error = total_error / features.len() as f64;

        self.coefficients
            .iter_mut()
            .for_each(|c| *c += mean_error * COEFFICIENT_STEP);
        self.bias += mean_error * BIAS_STEP;
        debug!(mean_error, bias = self.bias, "logistic regression updated");
        Ok(())
    }
}
