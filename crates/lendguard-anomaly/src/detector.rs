//! Ensemble anomaly detector combining four scoring methods.

use lendguard_tree::FeatureVector;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::{
    AnomalyError,
    forest::{IsolationForest, IsolationForestConfig},
    input::{AnomalyInput, NORMALIZED_DIMENSIONS},
    lof::LocalOutlierFactor,
    score::{AlgorithmScores, AnomalyScore},
    statistical::StatisticalDetector,
    zscore::ZScoreDetector,
};

/// Summary statistics over every value in the training history.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BaselineStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Weighted ensemble of z-score, isolation forest, LOF and rule-based detectors.
///
/// Before [`train_on_history`](Self::train_on_history) the isolation forest
/// and LOF contribute 0, so scores come from the z-score and rule terms only.
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    forest_config: IsolationForestConfig,
    zscore: ZScoreDetector,
    lof: LocalOutlierFactor,
    statistical: StatisticalDetector,
    forest: Option<IsolationForest>,
    history: Vec<FeatureVector>,
}

impl AnomalyDetector {
    /// Create an untrained detector with default sub-detectors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the isolation forest configuration used by the next training run.
    #[must_use]
    pub fn with_forest_config(mut self, config: IsolationForestConfig) -> Self {
        self.forest_config = config;
        self
    }

    /// Replace the z-score detector.
    #[must_use]
    pub fn with_zscore(mut self, zscore: ZScoreDetector) -> Self {
        self.zscore = zscore;
        self
    }

    /// Replace the LOF detector.
    #[must_use]
    pub fn with_lof(mut self, lof: LocalOutlierFactor) -> Self {
        self.lof = lof;
        self
    }

    /// Return `true` once a history has been trained on.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.forest.is_some()
    }

    /// Return the number of historical vectors held as the LOF reference set.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Train the isolation forest and install `history` as the LOF reference set.
    ///
    /// Each vector must be a normalized input (see [`AnomalyInput::normalize`]).
    /// On error the previous state is left untouched.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AnomalyError::EmptyHistory`] | `history` is empty |
    /// | [`AnomalyError::DimensionMismatch`] | a vector is not 9-dimensional |
    #[instrument(skip_all, fields(n_vectors = history.len()))]
    pub fn train_on_history<R: Rng + ?Sized>(
        &mut self,
        history: Vec<FeatureVector>,
        rng: &mut R,
    ) -> Result<(), AnomalyError> {
        if history.is_empty() {
            return Err(AnomalyError::EmptyHistory);
        }
        if let Some(row) = history.iter().find(|r| r.len() != NORMALIZED_DIMENSIONS) {
            return Err(AnomalyError::DimensionMismatch {
                expected: NORMALIZED_DIMENSIONS,
                got: row.len(),
            });
        }

        let forest = self.forest_config.fit(&history, rng)?;
        self.forest = Some(forest);
        self.history = history;

        info!(n_vectors = self.history.len(), "anomaly detector trained");
        Ok(())
    }

    /// Score one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError::NonFiniteField`] when a numeric field is not finite.
    #[instrument(skip_all)]
    pub fn detect(&self, input: &AnomalyInput) -> Result<AnomalyScore, AnomalyError> {
        let point = input.normalize()?;

        let z_score = self.zscore.detect(
            input.transaction_amount,
            input.historical_average,
            input.historical_std_dev,
        );
        let isolation_forest = match &self.forest {
            Some(forest) => forest.score(&point)?,
            None => {
                warn!("isolation forest untrained; contributing 0");
                0.0
            }
        };
        let local_outlier_factor = self.lof.detect(&point, &self.history);
        let statistical = self.statistical.detect(input);

        let algorithms = AlgorithmScores {
            z_score,
            isolation_forest,
            local_outlier_factor,
            statistical,
        };
        let reasons = explain(input, &algorithms);
        let score = AnomalyScore::from_algorithms(algorithms, reasons);

        debug!(
            overall = score.overall_score,
            severity = ?score.severity,
            "transaction scored"
        );
        Ok(score)
    }

    /// Mean, population standard deviation, min and max over all values in the
    /// history; all zeros before training.
    #[must_use]
    pub fn baseline_stats(&self) -> BaselineStats {
        let values: Vec<f64> = self
            .history
            .iter()
            .flat_map(|v| v.as_slice().iter().copied())
            .collect();
        if values.is_empty() {
            return BaselineStats {
                mean: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        BaselineStats {
            mean,
            std_dev: variance.sqrt(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

fn explain(input: &AnomalyInput, scores: &AlgorithmScores) -> Vec<String> {
    let checks = [
        (
            scores.z_score > 50.0,
            "Transaction amount significantly deviates from historical pattern",
        ),
        (
            scores.isolation_forest > 60.0,
            "Unusual feature combination detected by isolation analysis",
        ),
        (
            scores.local_outlier_factor > 40.0,
            "Local outlier detected in user behavior",
        ),
        (input.account_age < 30.0, "New account with limited history"),
        (input.user_reputation < 40.0, "Low user reputation score"),
        (input.country_changed(), "Geographic location changed significantly"),
        (input.off_hours(), "Transaction at unusual time of day"),
        (input.frequency_spike(), "Unusually high transaction frequency"),
    ];
    let reasons: Vec<String> = checks
        .iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, reason)| (*reason).to_string())
        .collect();
    if reasons.is_empty() {
        vec!["Pattern within normal parameters".to_string()]
    } else {
        reasons
    }
}
