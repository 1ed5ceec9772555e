//! Boosted linear regression.

use lendguard_tree::FeatureVector;
use tracing::{debug, instrument};

use crate::ForecastError;

/// A linear model fitted by online gradient descent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LinearLearner {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearLearner {
    fn fit(features: &[FeatureVector], targets: &[f64], learning_rate: f64, epochs: usize) -> Self {
        let n_features = features.first().map_or(0, FeatureVector::len);
        let mut learner = Self {
            coefficients: vec![0.0; n_features],
            intercept: 0.0,
        };
        for _ in 0..epochs {
            for (x, &y) in features.iter().zip(targets) {
                let error = y - learner.predict(x);
                learner.intercept += learning_rate * error;
                for (c, v) in learner.coefficients.iter_mut().zip(x.as_slice()) {
                    *c += learning_rate * error * v;
                }
            }
        }
        learner
    }

    fn predict(&self, x: &FeatureVector) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x.as_slice())
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    fn is_finite(&self) -> bool {
        self.intercept.is_finite() && self.coefficients.iter().all(|c| c.is_finite())
    }
}

/// Configuration for [`BoostedRegressor`].
///
/// # Defaults
///
/// | Parameter       | Default |
/// |-----------------|---------|
/// | `n_estimators`  | 50      |
/// | `shrinkage`     | 0.1     |
/// | `learning_rate` | 0.001   |
/// | `epochs`        | 100     |
#[derive(Debug, Clone)]
pub struct BoostedRegressorConfig {
    n_estimators: usize,
    shrinkage: f64,
    learning_rate: f64,
    epochs: usize,
}

impl BoostedRegressorConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            n_estimators: 50,
            shrinkage: 0.1,
            learning_rate: 0.001,
            epochs: 100,
        }
    }

    /// Set the number of base learners.
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Set the per-learner shrinkage.
    #[must_use]
    pub fn with_shrinkage(mut self, shrinkage: f64) -> Self {
        self.shrinkage = shrinkage;
        self
    }

    /// Set the gradient step of each base learner.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the passes each base learner makes over the data.
    #[must_use]
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Fit learners to successive residuals.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForecastError::TargetCountMismatch`] | row and target counts differ |
    /// | [`ForecastError::EmptyDataset`] | no rows |
    /// | [`ForecastError::DimensionMismatch`] | rows have inconsistent lengths |
    /// | [`ForecastError::NonFiniteValue`] | a target is NaN or infinite |
    /// | [`ForecastError::Diverged`] | a learner's coefficients become non-finite |
    #[instrument(skip_all, fields(n_estimators = self.n_estimators, n_samples = features.len()))]
    pub fn fit(
        &self,
        features: &[FeatureVector],
        targets: &[f64],
    ) -> Result<BoostedRegressor, ForecastError> {
        // --- Validate inputs ---
        if features.len() != targets.len() {
            return Err(ForecastError::TargetCountMismatch {
                n_samples: features.len(),
                n_targets: targets.len(),
            });
        }
        let n_features = features.first().ok_or(ForecastError::EmptyDataset)?.len();
        if let Some(row) = features.iter().find(|row| row.len() != n_features) {
            return Err(ForecastError::DimensionMismatch {
                expected: n_features,
                got: row.len(),
            });
        }
        crate::error::check_finite(targets)?;

        let mut residuals = targets.to_vec();
        let mut learners = Vec::with_capacity(self.n_estimators);
        for estimator in 0..self.n_estimators {
            let learner =
                LinearLearner::fit(features, &residuals, self.learning_rate, self.epochs);
            if !learner.is_finite() {
                return Err(ForecastError::Diverged { estimator });
            }
            for (r, x) in residuals.iter_mut().zip(features) {
                *r -= self.shrinkage * learner.predict(x);
            }
            learners.push(learner);
        }

        debug!(
            final_mse = residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64,
            "boosted regressor fitted"
        );
        Ok(BoostedRegressor {
            learners,
            shrinkage: self.shrinkage,
            n_features,
        })
    }
}

impl Default for BoostedRegressorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A fitted sequence of shrunken linear learners.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BoostedRegressor {
    learners: Vec<LinearLearner>,
    shrinkage: f64,
    n_features: usize,
}

impl BoostedRegressor {
    /// Sum of shrunken learner outputs.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::DimensionMismatch`] on arity mismatch.
    pub fn predict(&self, x: &FeatureVector) -> Result<f64, ForecastError> {
        if x.len() != self.n_features {
            return Err(ForecastError::DimensionMismatch {
                expected: self.n_features,
                got: x.len(),
            });
        }
        Ok(self
            .learners
            .iter()
            .map(|l| self.shrinkage * l.predict(x))
            .sum())
    }

    /// Return the number of fitted learners.
    #[must_use]
    pub fn n_estimators(&self) -> usize {
        self.learners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(values: &[f64]) -> FeatureVector {
        FeatureVector::new(values.to_vec()).unwrap()
    }

    #[test]
    fn fits_a_line() {
        let features: Vec<FeatureVector> = (0..20).map(|i| fv(&[i as f64 / 10.0])).collect();
        let targets: Vec<f64> = (0..20).map(|i| 1.0 + 2.0 * i as f64 / 10.0).collect();
        let model = BoostedRegressorConfig::new()
            .with_learning_rate(0.05)
            .fit(&features, &targets)
            .unwrap();
        assert_eq!(model.n_estimators(), 50);
        let pred = model.predict(&fv(&[1.0])).unwrap();
        assert!((pred - 3.0).abs() < 0.2, "pred = {pred}");
    }

    #[test]
    fn more_learners_reduce_error() {
        let features: Vec<FeatureVector> = (0..10).map(|i| fv(&[i as f64])).collect();
        let targets: Vec<f64> = (0..10).map(|i| 3.0 * i as f64).collect();
        let mse = |n| {
            let model = BoostedRegressorConfig::new()
                .with_n_estimators(n)
                .fit(&features, &targets)
                .unwrap();
            features
                .iter()
                .zip(&targets)
                .map(|(x, t)| (model.predict(x).unwrap() - t).powi(2))
                .sum::<f64>()
        };
        assert!(mse(20) < mse(2));
    }

    #[test]
    fn huge_learning_rate_diverges() {
        let features: Vec<FeatureVector> = (0..10).map(|i| fv(&[1e3 * i as f64])).collect();
        let targets: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let err = BoostedRegressorConfig::new()
            .with_learning_rate(10.0)
            .fit(&features, &targets)
            .unwrap_err();
        assert!(matches!(err, ForecastError::Diverged { estimator: 0 }));
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(matches!(
            BoostedRegressorConfig::new().fit(&[], &[]),
            Err(ForecastError::EmptyDataset)
        ));
        assert!(matches!(
            BoostedRegressorConfig::new().fit(&[fv(&[1.0]), fv(&[1.0, 2.0])], &[1.0, 2.0]),
            Err(ForecastError::DimensionMismatch { .. })
        ));
    }
}
