//! Weighted four-model risk ensemble.

use lendguard_tree::FeatureVector;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::{
    GradientBoostingRegressor, LogisticRegression, NeuralNetwork, RandomForestRegressor,
    RiskError,
    model::{RiskModel, check_arity, validate_training_set},
};

/// Names of the normalized ensemble features, in vector order.
pub const ENSEMBLE_FEATURES: [&str; 10] = [
    "payment_history",
    "loan_utilization",
    "account_age",
    "reputation_score",
    "wallet_stability",
    "transaction_frequency",
    "default_risk",
    "income_stability",
    "asset_value",
    "collateral_ratio",
];

/// Member weights: random forest, gradient boosting, neural network, logistic.
const MEMBER_WEIGHTS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];
/// Value used for a missing or zero optional field.
const MISSING_OPTIONAL: f64 = 50.0;
/// Members disagreeing with the first by more than this flag an anomaly.
const DISAGREEMENT_LIMIT: f64 = 30.0;
/// A cross-validation prediction within this distance of the target is correct.
const CV_TOLERANCE: f64 = 20.0;

/// Raw borrower attributes scored by the ensemble.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EnsembleInput {
    pub payment_history: f64,
    pub loan_utilization: f64,
    pub account_age: f64,
    pub reputation_score: f64,
    pub wallet_stability: f64,
    pub transaction_frequency: f64,
    pub default_risk: f64,
    pub income_stability: f64,
    #[serde(default)]
    pub asset_value: Option<f64>,
    #[serde(default)]
    pub collateral_ratio: Option<f64>,
}

impl EnsembleInput {
    /// Map the raw fields onto the 10-feature vector.
    ///
    /// The eight required fields are capped at 100. `asset_value` is scaled
    /// by 1/10000 and `collateral_ratio` by 100; either becomes 50 when
    /// missing or zero.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::NonFiniteField`] when any field is NaN or infinite.
    pub fn normalize(&self) -> Result<FeatureVector, RiskError> {
        let required = [
            ("payment_history", self.payment_history),
            ("loan_utilization", self.loan_utilization),
            ("account_age", self.account_age),
            ("reputation_score", self.reputation_score),
            ("wallet_stability", self.wallet_stability),
            ("transaction_frequency", self.transaction_frequency),
            ("default_risk", self.default_risk),
            ("income_stability", self.income_stability),
        ];
        let optional = [
            ("asset_value", self.asset_value),
            ("collateral_ratio", self.collateral_ratio),
        ];
        if let Some(&(field, _)) = required.iter().find(|(_, v)| !v.is_finite()) {
            return Err(RiskError::NonFiniteField { field });
        }
        if let Some(&(field, _)) = optional
            .iter()
            .find(|(_, v)| v.is_some_and(|v| !v.is_finite()))
        {
            return Err(RiskError::NonFiniteField { field });
        }

        let mut values: Vec<f64> = required.iter().map(|&(_, v)| v.min(100.0)).collect();
        values.push(scaled_optional(self.asset_value, 1.0 / 10_000.0));
        values.push(scaled_optional(self.collateral_ratio, 100.0));
        Ok(FeatureVector::new(values)?)
    }
}

fn scaled_optional(value: Option<f64>, scale: f64) -> f64 {
    match value {
        Some(v) if v != 0.0 => (v * scale).min(100.0),
        _ => MISSING_OPTIONAL,
    }
}

/// What to do with the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendedAction {
    Approve,
    Warn,
    Deny,
}

impl RecommendedAction {
    /// Warn on low confidence; otherwise band the risk at 30 and 70.
    #[must_use]
    pub fn from_risk(risk: f64, confidence: f64) -> Self {
        if confidence < 60.0 {
            RecommendedAction::Warn
        } else if risk < 30.0 {
            RecommendedAction::Approve
        } else if risk < 70.0 {
            RecommendedAction::Warn
        } else {
            RecommendedAction::Deny
        }
    }
}

/// Per-member predictions.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelScores {
    pub random_forest: f64,
    pub gradient_boosting: f64,
    pub neural_network: f64,
    pub logistic_regression: f64,
}

impl ModelScores {
    fn as_array(&self) -> [f64; 4] {
        [
            self.random_forest,
            self.gradient_boosting,
            self.neural_network,
            self.logistic_regression,
        ]
    }
}

/// The ensemble's verdict for one input.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EnsemblePrediction {
    /// Weighted prediction rounded to an integer.
    pub risk_score: f64,
    /// `max(0, 100 - population stddev of member predictions)`.
    pub confidence: f64,
    pub model_scores: ModelScores,
    pub weighted_prediction: f64,
    pub anomaly_detected: bool,
    pub recommended_action: RecommendedAction,
}

/// Named importance of one ensemble feature.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FeatureImportance {
    pub feature: &'static str,
    pub importance: f64,
}

/// Blend member predictions for the normalized input `x`.
#[must_use]
pub fn combine(x: &FeatureVector, scores: ModelScores) -> EnsemblePrediction {
    let predictions = scores.as_array();
    let weighted: f64 = predictions
        .iter()
        .zip(MEMBER_WEIGHTS)
        .map(|(p, w)| p * w)
        .sum();

    let mean = predictions.iter().sum::<f64>() / predictions.len() as f64;
    let variance = predictions.iter().map(|p| (p - mean).powi(2)).sum::<f64>()
        / predictions.len() as f64;
    let confidence = (100.0 - variance.sqrt()).max(0.0);

    EnsemblePrediction {
        risk_score: weighted.round(),
        confidence,
        model_scores: scores,
        weighted_prediction: weighted,
        anomaly_detected: is_anomalous(x, &predictions),
        recommended_action: RecommendedAction::from_risk(weighted, confidence),
    }
}

/// Members disagree, or an extreme input pairs high payment history with low
/// income stability.
fn is_anomalous(x: &FeatureVector, predictions: &[f64; 4]) -> bool {
    let disagreement = predictions
        .iter()
        .any(|p| (p - predictions[0]).abs() > DISAGREEMENT_LIMIT);
    let extreme = x.as_slice().iter().any(|&v| !(20.0..=90.0).contains(&v));
    let unusual = x.get(7).is_some_and(|income| income < 30.0)
        && x.get(0).is_some_and(|payment| payment > 80.0);
    disagreement || (extreme && unusual)
}

/// The random forest, gradient boosting, neural network and logistic members
/// with fixed blend weights.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RiskEnsemble {
    random_forest: RandomForestRegressor,
    gradient_boosting: GradientBoostingRegressor,
    neural_network: NeuralNetwork,
    logistic_regression: LogisticRegression,
}

impl RiskEnsemble {
    /// Create an ensemble over the 10 normalized features. Neural network
    /// weights are drawn from `rng`.
    ///
    /// # Errors
    ///
    /// Propagates member construction errors.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Result<Self, RiskError> {
        let n = ENSEMBLE_FEATURES.len();
        Ok(Self {
            random_forest: RandomForestRegressor::new(n),
            gradient_boosting: GradientBoostingRegressor::new(n)?,
            neural_network: NeuralNetwork::new(n, rng)?,
            logistic_regression: LogisticRegression::new(n)?,
        })
    }

    /// Replace the random forest member's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::InvalidTreeCount`] when `n_trees` is 0.
    pub fn with_forest_trees(mut self, n_trees: usize) -> Result<Self, RiskError> {
        self.random_forest = self.random_forest.with_n_trees(n_trees)?;
        Ok(self)
    }

    /// Enable residual correction on the gradient boosting member.
    #[must_use]
    pub fn with_residual_correction(mut self, enabled: bool) -> Self {
        self.gradient_boosting = self.gradient_boosting.with_residual_correction(enabled);
        self
    }

    /// Members paired with their blend weights, in [`ModelScores`] order.
    #[must_use]
    pub fn members(&self) -> [(&dyn RiskModel, f64); 4] {
        [
            (&self.random_forest as &dyn RiskModel, MEMBER_WEIGHTS[0]),
            (&self.gradient_boosting, MEMBER_WEIGHTS[1]),
            (&self.neural_network, MEMBER_WEIGHTS[2]),
            (&self.logistic_regression, MEMBER_WEIGHTS[3]),
        ]
    }

    /// Normalize and score one input.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::NonFiniteField`] for non-finite input fields.
    pub fn predict(&self, input: &EnsembleInput) -> Result<EnsemblePrediction, RiskError> {
        self.predict_vector(&input.normalize()?)
    }

    /// Score an already normalized vector.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::DimensionMismatch`] unless `x` has 10 features.
    pub fn predict_vector(&self, x: &FeatureVector) -> Result<EnsemblePrediction, RiskError> {
        check_arity(x, ENSEMBLE_FEATURES.len())?;
        let mut predictions = [0.0; 4];
        for (slot, (model, _)) in predictions.iter_mut().zip(self.members()) {
            *slot = model.predict(x)?;
        }
        let [random_forest, gradient_boosting, neural_network, logistic_regression] = predictions;
        let scores = ModelScores {
            random_forest,
            gradient_boosting,
            neural_network,
            logistic_regression,
        };
        Ok(combine(x, scores))
    }

    /// Train every member on normalized vectors.
    ///
    /// Members train into copies that replace the current members only when
    /// all of them succeed.
    ///
    /// # Errors
    ///
    /// Returns the first member's training error.
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn train(
        &mut self,
        features: &[FeatureVector],
        targets: &[f64],
        rng: &mut dyn RngCore,
    ) -> Result<(), RiskError> {
        validate_training_set(features, targets, ENSEMBLE_FEATURES.len())?;

        let mut random_forest = self.random_forest.clone();
        let mut gradient_boosting = self.gradient_boosting.clone();
        let mut neural_network = self.neural_network.clone();
        let mut logistic_regression = self.logistic_regression.clone();
        random_forest.train(features, targets, rng)?;
        gradient_boosting.train(features, targets, rng)?;
        neural_network.train(features, targets, rng)?;
        logistic_regression.train(features, targets, rng)?;

        self.random_forest = random_forest;
        self.gradient_boosting = gradient_boosting;
        self.neural_network = neural_network;
        self.logistic_regression = logistic_regression;
        info!(n_samples = features.len(), "risk ensemble trained");
        Ok(())
    }

    /// K-fold accuracy of the neural network member, in percent per fold.
    ///
    /// Folds are contiguous blocks of `n / folds` samples with the last
    /// fold taking the remainder. Each fold trains a copy of the current
    /// network; a test prediction within 20 of its target counts as correct.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RiskError::InvalidFoldCount`] | `folds < 2` or `folds > n` |
    /// | training-set errors | see [`validate_training_set`] |
    #[instrument(skip_all, fields(folds = folds, n_samples = features.len()))]
    pub fn cross_validate(
        &self,
        features: &[FeatureVector],
        targets: &[f64],
        folds: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>, RiskError> {
        validate_training_set(features, targets, ENSEMBLE_FEATURES.len())?;
        let n_samples = features.len();
        if folds < 2 || folds > n_samples {
            return Err(RiskError::InvalidFoldCount { folds, n_samples });
        }
        let fold_size = n_samples / folds;

        let fold_seeds: Vec<u64> = (0..folds).map(|_| rng.next_u64()).collect();
        fold_seeds
            .into_par_iter()
            .enumerate()
            .map(|(fold, seed)| -> Result<f64, RiskError> {
                let test_start = fold * fold_size;
                let test_end = if fold == folds - 1 {
                    n_samples
                } else {
                    (fold + 1) * fold_size
                };

                let (train_x, train_y): (Vec<FeatureVector>, Vec<f64>) = (0..n_samples)
                    .filter(|&i| i < test_start || i >= test_end)
                    .map(|i| (features[i].clone(), targets[i]))
                    .unzip();

                let mut network = self.neural_network.clone();
                network.train(&train_x, &train_y, &mut ChaCha8Rng::seed_from_u64(seed))?;

                let mut correct = 0usize;
                for i in test_start..test_end {
                    if (network.predict(&features[i])? - targets[i]).abs() < CV_TOLERANCE {
                        correct += 1;
                    }
                }
                let accuracy = correct as f64 / (test_end - test_start) as f64 * 100.0;
                debug!(fold, accuracy, "fold evaluated");
                Ok(accuracy)
            })
            .collect()
    }

    /// Random forest importances by feature name; uniform when untrained.
    #[must_use]
    pub fn feature_importance(&self) -> Vec<FeatureImportance> {
        ENSEMBLE_FEATURES
            .iter()
            .zip(self.random_forest.feature_importances())
            .map(|(&feature, importance)| FeatureImportance {
                feature,
                importance,
            })
            .collect()
    }
}
