//! Per-epoch metrics and run results.

use crate::Hyperparameter;

/// Metrics recorded after one training epoch.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainingMetrics {
    pub epoch: usize,
    /// Mean mini-batch loss.
    pub train_loss: f64,
    pub validation_loss: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// The epoch with the lowest validation loss.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BestEpoch {
    pub epoch: usize,
    pub train_loss: f64,
    pub validation_loss: f64,
}

/// Overview of the last training run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrainingSummary {
    pub epochs: usize,
    pub final_accuracy: f64,
    pub final_loss: f64,
    pub best_loss: f64,
    pub best_epoch: usize,
}

/// Final accuracy per fold with mean and population standard deviation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrossValidationResult {
    pub folds: usize,
    pub fold_results: Vec<f64>,
    pub mean_accuracy: f64,
    pub std_deviation: f64,
}

impl CrossValidationResult {
    pub(crate) fn from_folds(fold_results: Vec<f64>) -> Self {
        let folds = fold_results.len();
        let mean_accuracy = fold_results.iter().sum::<f64>() / folds as f64;
        let variance = fold_results
            .iter()
            .map(|a| (a - mean_accuracy).powi(2))
            .sum::<f64>()
            / folds as f64;
        Self {
            folds,
            fold_results,
            mean_accuracy,
            std_deviation: variance.sqrt(),
        }
    }
}

/// Outcome of one grid-search combination.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TuningRun {
    pub hyperparameters: Vec<Hyperparameter>,
    pub accuracy: f64,
    pub loss: f64,
}

/// Every grid-search run plus the winner by final accuracy.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HyperparameterTuningResult {
    pub best_hyperparameters: Vec<Hyperparameter>,
    pub best_accuracy: f64,
    pub best_loss: f64,
    pub all_results: Vec<TuningRun>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_statistics() {
        let cv = CrossValidationResult::from_folds(vec![0.6, 0.8, 0.7, 0.9]);
        assert_eq!(cv.folds, 4);
        assert!((cv.mean_accuracy - 0.75).abs() < 1e-12);
        assert!((cv.std_deviation - 0.0125f64.sqrt()).abs() < 1e-12);
    }
}
