//! Single-layer sigmoid regressor.

use lendguard_tree::FeatureVector;
use rand::{Rng, RngCore};
use tracing::{debug, instrument};

use crate::{
    RiskError,
    model::{ModelKind, RiskModel, check_arity, validate_training_set},
};

/// A single sigmoid unit scaled to `[0, 100]`, trained by online gradient
/// descent on the raw error.
///
/// # Defaults
///
/// | Parameter       | Default |
/// |-----------------|---------|
/// | `learning_rate` | 0.01    |
/// | `epochs`        | 100     |
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NeuralNetwork {
    weights: Vec<f64>,
    bias: f64,
    learning_rate: f64,
    epochs: usize,
}

impl NeuralNetwork {
    /// Create a network with `n_inputs` weights drawn from `[0, 0.5)` and a
    /// bias drawn from `[0, 0.1)`.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::TooFewInputs`] when `n_inputs` is 0.
    pub fn new<R: Rng + ?Sized>(n_inputs: usize, rng: &mut R) -> Result<Self, RiskError> {
        if n_inputs == 0 {
            return Err(RiskError::TooFewInputs {
                model: "neural network",
                required: 1,
                n_features: 0,
            });
        }
        let weights = (0..n_inputs).map(|_| rng.gen_range(0.0..0.5)).collect();
        Ok(Self {
            weights,
            bias: rng.gen_range(0.0..0.1),
            learning_rate: 0.01,
            epochs: 100,
        })
    }

    /// Set the number of passes over the training set.
    #[must_use]
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the gradient step size.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    // --- Getters ---

    /// Return the current weights.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Return the current bias.
    #[must_use]
    pub fn bias(&self) -> f64 {
        self.bias
    }

    fn forward(weights: &[f64], bias: f64, x: &[f64]) -> f64 {
        let sum = bias + weights.iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
        100.0 / (1.0 + (-sum).exp())
    }
}

impl RiskModel for NeuralNetwork {
    fn kind(&self) -> ModelKind {
        ModelKind::NeuralNetwork
    }

    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn predict(&self, x: &FeatureVector) -> Result<f64, RiskError> {
        check_arity(x, self.weights.len())?;
        Ok(Self::forward(&self.weights, self.bias, x.as_slice()))
    }

    /// # Errors
    ///
    /// Besides the training-set checks, returns [`RiskError::Diverged`] when
    /// a weight becomes non-finite; the previous weights are kept.
    #[instrument(skip_all, fields(epochs = self.epochs, n_samples = features.len()))]
    fn train(
        &mut self,
        features: &[FeatureVector],
        targets: &[f64],
        _rng: &mut dyn RngCore,
    ) -> Result<(), RiskError> {
        validate_training_set(features, targets, self.weights.len())?;

        let mut weights = self.weights.clone();
        let mut bias = self.bias;
        for _ in 0..self.epochs {
            for (x, &target) in features.iter().zip(targets) {
                let error = target - Self::forward(&weights, bias, x.as_slice());
                for (w, v) in weights.iter_mut().zip(x.as_slice()) {
                    *w += self.learning_rate * error * v;
                }
                bias += self.learning_rate * error;
            }
        }

        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(RiskError::Diverged {
                model: "neural network",
            });
        }
        debug!(bias, "neural network trained");
        self.weights = weights;
        self.bias = bias;
        Ok(())
    }
}
