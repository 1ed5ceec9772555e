//! Binary classification metrics.

use crate::TrainError;

/// Cut-off above which a score or label counts as positive.
const POSITIVE_CUTOFF: f64 = 0.5;

/// A 2x2 confusion matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct BinaryConfusion {
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_positives: usize,
}

impl BinaryConfusion {
    /// Count outcomes with `prediction > threshold` against `target > 0.5`.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::LengthMismatch`] when the slices differ in length.
    pub fn at_threshold(
        predictions: &[f64],
        targets: &[f64],
        threshold: f64,
    ) -> Result<Self, TrainError> {
        check_lengths(predictions, targets)?;
        let mut matrix = Self::default();
        for (&p, &t) in predictions.iter().zip(targets) {
            match (p > threshold, t > POSITIVE_CUTOFF) {
                (false, false) => matrix.true_negatives += 1,
                (true, false) => matrix.false_positives += 1,
                (false, true) => matrix.false_negatives += 1,
                (true, true) => matrix.true_positives += 1,
            }
        }
        Ok(matrix)
    }

    /// Proportion of correct predictions; 0 when empty.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let total = self.true_negatives + self.false_positives + self.false_negatives + self.true_positives;
        ratio(self.true_positives + self.true_negatives, total)
    }

    /// TP / (TP + FP); 0 without positive predictions.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN); 0 without positive targets.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall; 0 when both are 0.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }

    /// Rows `[[TN, FP], [FN, TP]]`.
    #[must_use]
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [
            [self.true_negatives, self.false_positives],
            [self.false_negatives, self.true_positives],
        ]
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn check_lengths(predictions: &[f64], targets: &[f64]) -> Result<(), TrainError> {
    if predictions.len() != targets.len() {
        return Err(TrainError::LengthMismatch {
            n_predictions: predictions.len(),
            n_targets: targets.len(),
        });
    }
    Ok(())
}

/// Confusion matrix at the 0.5 cut-off.
///
/// # Errors
///
/// Returns [`TrainError::LengthMismatch`] when the slices differ in length.
pub fn confusion_matrix(predictions: &[f64], targets: &[f64]) -> Result<BinaryConfusion, TrainError> {
    BinaryConfusion::at_threshold(predictions, targets, POSITIVE_CUTOFF)
}

/// Area under the ROC curve by pair counting.
///
/// Samples are ranked by descending prediction; every negative adds the
/// number of positives ranked above it. Returns 0 when either class is
/// absent.
///
/// # Errors
///
/// Returns [`TrainError::LengthMismatch`] when the slices differ in length.
pub fn roc_auc(predictions: &[f64], targets: &[f64]) -> Result<f64, TrainError> {
    check_lengths(predictions, targets)?;
    let mut ranked: Vec<(f64, bool)> = predictions
        .iter()
        .zip(targets)
        .map(|(&p, &t)| (p, t > POSITIVE_CUTOFF))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut positives_seen = 0usize;
    let mut negatives = 0usize;
    let mut pairs = 0usize;
    for (_, positive) in ranked {
        if positive {
            positives_seen += 1;
        } else {
            pairs += positives_seen;
            negatives += 1;
        }
    }
    if negatives == 0 || positives_seen == 0 {
        return Ok(0.0);
    }
    Ok(pairs as f64 / (negatives * positives_seen) as f64)
}

/// One point of a precision-recall curve.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PrPoint {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
}

/// Precision and recall at thresholds 0, 0.1, …, 1.0 with `prediction > threshold`.
///
/// # Errors
///
/// Returns [`TrainError::LengthMismatch`] when the slices differ in length.
pub fn precision_recall_curve(
    predictions: &[f64],
    targets: &[f64],
) -> Result<Vec<PrPoint>, TrainError> {
    (0..=10u32)
        .map(|step| -> Result<PrPoint, TrainError> {
            let threshold = f64::from(step) / 10.0;
            let matrix = BinaryConfusion::at_threshold(predictions, targets, threshold)?;
            Ok(PrPoint {
                threshold,
                precision: matrix.precision(),
                recall: matrix.recall(),
            })
        })
        .collect()
}
