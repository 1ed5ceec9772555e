//! Trainable binary classifiers.

use lendguard_tree::FeatureVector;

use crate::{Regularization, TrainError};

/// Penalty strength for L1 and L2 regularization.
pub const REGULARIZATION_STRENGTH: f64 = 1e-3;
/// Probabilities are clamped away from 0 and 1 inside the log loss.
const LOG_EPS: f64 = 1e-12;

/// A labelled training example. Labels above 0.5 are the positive class.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Sample {
    pub features: FeatureVector,
    pub label: f64,
}

impl Sample {
    #[must_use]
    pub fn new(features: FeatureVector, label: f64) -> Self {
        Self { features, label }
    }

    /// 1.0 for the positive class, else 0.0.
    #[must_use]
    pub fn target(&self) -> f64 {
        if self.label > 0.5 { 1.0 } else { 0.0 }
    }
}

/// A model the [`Trainer`](crate::Trainer) can fit with mini-batch updates.
pub trait TrainableModel: Clone + std::fmt::Debug + Send + Sync {
    /// Arity of the inputs.
    fn n_features(&self) -> usize;

    /// Probability of the positive class.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::FeatureCountMismatch`] on arity mismatch.
    fn predict(&self, x: &FeatureVector) -> Result<f64, TrainError>;

    /// Take one gradient step on `batch` and return its loss before the step.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::FeatureCountMismatch`] on arity mismatch.
    fn train_batch(
        &mut self,
        batch: &[&Sample],
        learning_rate: f64,
        regularization: Regularization,
    ) -> Result<f64, TrainError>;

    /// Mean loss over `samples`; 0 for an empty slice.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::FeatureCountMismatch`] on arity mismatch.
    fn loss(&self, samples: &[Sample]) -> Result<f64, TrainError>;

    /// Whether every parameter is finite.
    fn is_finite(&self) -> bool;
}

/// Logistic regression trained on binary cross-entropy.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LogisticClassifier {
    weights: Vec<f64>,
    bias: f64,
}

impl LogisticClassifier {
    /// Create a classifier with zero weights over `n_features` inputs.
    #[must_use]
    pub fn new(n_features: usize) -> Self {
        Self {
            weights: vec![0.0; n_features],
            bias: 0.0,
        }
    }

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

    fn check(&self, x: &FeatureVector, sample_index: usize) -> Result<(), TrainError> {
        if x.len() != self.weights.len() {
            return Err(TrainError::FeatureCountMismatch {
                expected: self.weights.len(),
                got: x.len(),
                sample_index,
            });
        }
        Ok(())
    }

    fn probability(&self, x: &FeatureVector) -> f64 {
        let z = self.bias
            + self
                .weights
                .iter()
                .zip(x.as_slice())
                .map(|(w, v)| w * v)
                .sum::<f64>();
        1.0 / (1.0 + (-z).exp())
    }
}

fn log_loss(p: f64, y: f64) -> f64 {
    let p = p.clamp(LOG_EPS, 1.0 - LOG_EPS);
    -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
}

impl TrainableModel for LogisticClassifier {
    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn predict(&self, x: &FeatureVector) -> Result<f64, TrainError> {
        self.check(x, 0)?;
        Ok(self.probability(x))
    }

    fn train_batch(
        &mut self,
        batch: &[&Sample],
        learning_rate: f64,
        regularization: Regularization,
    ) -> Result<f64, TrainError> {
        if batch.is_empty() {
            return Ok(0.0);
        }
        let mut grad_w = vec![0.0; self.weights.len()];
        let mut grad_b = 0.0;
        let mut loss = 0.0;
        for (i, sample) in batch.iter().enumerate() {
            self.check(&sample.features, i)?;
            let p = self.probability(&sample.features);
            let y = sample.target();
            loss += log_loss(p, y);
            let err = p - y;
            for (g, v) in grad_w.iter_mut().zip(sample.features.as_slice()) {
                *g += err * v;
            }
            grad_b += err;
        }
        let n = batch.len() as f64;
        for (w, g) in self.weights.iter_mut().zip(&grad_w) {
            let penalty = match regularization {
                Regularization::None => 0.0,
                Regularization::L1 if *w != 0.0 => REGULARIZATION_STRENGTH * w.signum(),
                Regularization::L1 => 0.0,
                Regularization::L2 => REGULARIZATION_STRENGTH * *w,
            };
            *w -= learning_rate * (g / n + penalty);
        }
        self.bias -= learning_rate * grad_b / n;
        Ok(loss / n)
    }

    fn loss(&self, samples: &[Sample]) -> Result<f64, TrainError> {
        if samples.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for (i, sample) in samples.iter().enumerate() {
            self.check(&sample.features, i)?;
            total += log_loss(self.probability(&sample.features), sample.target());
        }
        Ok(total / samples.len() as f64)
    }

    fn is_finite(&self) -> bool {
        self.bias.is_finite() && self.weights.iter().all(|w| w.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(values: &[f64], label: f64) -> Sample {
        Sample::new(FeatureVector::new(values.to_vec()).unwrap(), label)
    }

    #[test]
    fn zero_model_predicts_half() {
        let model = LogisticClassifier::new(2);
        let p = model.predict(&FeatureVector::new(vec![3.0, -1.0]).unwrap()).unwrap();
        assert_eq!(p, 0.5);
        let loss = model.loss(&[sample(&[1.0, 1.0], 1.0)]).unwrap();
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn gradient_step_lowers_loss() {
        let data = [sample(&[1.0], 1.0), sample(&[-1.0], 0.0)];
        let batch: Vec<&Sample> = data.iter().collect();
        let mut model = LogisticClassifier::new(1);
        let first = model.train_batch(&batch, 0.5, Regularization::None).unwrap();
        let second = model.train_batch(&batch, 0.5, Regularization::None).unwrap();
        assert!(second < first);
        assert!(model.weights()[0] > 0.0);
    }

    #[test]
    fn l2_shrinks_weights() {
        let data = [sample(&[1.0], 1.0), sample(&[-1.0], 0.0)];
        let batch: Vec<&Sample> = data.iter().collect();
        let mut plain = LogisticClassifier::new(1);
        let mut ridge = LogisticClassifier::new(1);
        for _ in 0..50 {
            plain.train_batch(&batch, 0.5, Regularization::None).unwrap();
            ridge.train_batch(&batch, 0.5, Regularization::L2).unwrap();
        }
        assert!(ridge.weights()[0] < plain.weights()[0]);
    }

    #[test]
    fn labels_threshold_at_half() {
        assert_eq!(sample(&[], 0.7).target(), 1.0);
        assert_eq!(sample(&[], 0.5).target(), 0.0);
    }

    #[test]
    fn arity_mismatch_reports_sample() {
        let data = [sample(&[1.0], 1.0), sample(&[1.0, 2.0], 0.0)];
        let batch: Vec<&Sample> = data.iter().collect();
        let err = LogisticClassifier::new(1)
            .train_batch(&batch, 0.1, Regularization::None)
            .unwrap_err();
        assert!(matches!(
            err,
            TrainError::FeatureCountMismatch { expected: 1, got: 2, sample_index: 1 }
        ));
    }
}
