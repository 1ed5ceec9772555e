//! Mini-batch training runs, k-fold cross-validation and grid search.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::{
    BestEpoch, CrossValidationResult, HyperparameterGrid, HyperparameterTuningResult,
    LogisticClassifier, ModelTrainingConfig, Sample, TrainError, TrainableModel,
    TrainingMetrics, TrainingSummary, TuningRun, confusion_matrix,
};

/// Minimum epochs for a cross-validation fold.
const MIN_FOLD_EPOCHS: usize = 10;

/// Fits a [`TrainableModel`] and keeps the history of its last run.
///
/// Every run starts from a copy of the template model given to
/// [`Trainer::new`]. The fitted model, history and best epoch are replaced
/// only when a run succeeds.
#[derive(Debug, Clone)]
pub struct Trainer<M: TrainableModel = LogisticClassifier> {
    template: M,
    model: Option<M>,
    history: Vec<TrainingMetrics>,
    best: Option<BestEpoch>,
}

impl Trainer<LogisticClassifier> {
    /// A trainer for a zero-initialized logistic classifier.
    #[must_use]
    pub fn logistic(n_features: usize) -> Self {
        Self::new(LogisticClassifier::new(n_features))
    }
}

impl<M: TrainableModel> Trainer<M> {
    /// A trainer that clones `template` as the starting point of every run.
    #[must_use]
    pub fn new(template: M) -> Self {
        Self {
            template,
            model: None,
            history: Vec::new(),
            best: None,
        }
    }

    // --- Getters ---

    /// The model fitted by the last successful run.
    #[must_use]
    pub fn model(&self) -> Option<&M> {
        self.model.as_ref()
    }

    /// Per-epoch metrics of the last successful run.
    #[must_use]
    pub fn history(&self) -> &[TrainingMetrics] {
        &self.history
    }

    /// The lowest-validation-loss epoch of the last successful run.
    #[must_use]
    pub fn best_epoch(&self) -> Option<BestEpoch> {
        self.best
    }

    /// Overview of the last run; `None` before any run.
    #[must_use]
    pub fn summary(&self) -> Option<TrainingSummary> {
        let last = self.history.last()?;
        let best = self.best?;
        Some(TrainingSummary {
            epochs: self.history.len(),
            final_accuracy: last.accuracy,
            final_loss: last.validation_loss,
            best_loss: best.validation_loss,
            best_epoch: best.epoch,
        })
    }

    /// Train a fresh copy of the template on `dataset`.
    ///
    /// The first `floor(n * (1 - validation_split))` samples train and the
    /// rest validate; with no validation samples the training partition is
    /// evaluated instead. Each epoch shuffles the training partition with a
    /// generator seeded from the config, steps through mini-batches, then
    /// records one [`TrainingMetrics`] row.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TrainError::EmptyDataset`] | `dataset` is empty |
    /// | [`TrainError::FeatureCountMismatch`] | a sample has the wrong arity |
    /// | [`TrainError::NonFiniteLabel`] | a label is NaN or infinite |
    /// | [`TrainError::EmptyTrainingPartition`] | the split leaves nothing to train on |
    /// | [`TrainError::Diverged`] | parameters become non-finite |
    #[instrument(skip_all, fields(n_samples = dataset.len(), epochs = config.epochs))]
    pub fn train_model(
        &mut self,
        dataset: &[Sample],
        config: &ModelTrainingConfig,
    ) -> Result<&[TrainingMetrics], TrainError> {
        let (model, history, best) = run(&self.template, dataset, config)?;
        self.model = Some(model);
        self.history = history;
        self.best = Some(best);
        Ok(&self.history)
    }

    /// K-fold cross-validation on contiguous folds of `ceil(n / k)` samples.
    ///
    /// Each fold trains a fresh model on the samples outside the fold for
    /// `max(epochs / 2, 10)` epochs and reports its final accuracy. Folds run
    /// in parallel and results keep fold order.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::InvalidFoldCount`] when `k < 2` or `k > n`, or
    /// any error from [`Trainer::train_model`] on a fold.
    #[instrument(skip_all, fields(k = k, n_samples = dataset.len()))]
    pub fn cross_validate(
        &self,
        dataset: &[Sample],
        config: &ModelTrainingConfig,
        k: usize,
    ) -> Result<CrossValidationResult, TrainError> {
        let n_samples = dataset.len();
        if k < 2 || k > n_samples {
            return Err(TrainError::InvalidFoldCount {
                folds: k,
                n_samples,
            });
        }
        let fold_size = n_samples.div_ceil(k);
        let fold_config = config
            .clone()
            .with_epochs((config.epochs / 2).max(MIN_FOLD_EPOCHS))?;

        let fold_results = (0..k)
            .into_par_iter()
            .map(|fold| -> Result<f64, TrainError> {
                let test_start = (fold * fold_size).min(n_samples);
                let test_end = (test_start + fold_size).min(n_samples);
                let train: Vec<Sample> = dataset[..test_start]
                    .iter()
                    .chain(&dataset[test_end..])
                    .cloned()
                    .collect();
                let (_, history, _) = run(&self.template, &train, &fold_config)?;
                let accuracy = history.last().map_or(0.0, |m| m.accuracy);
                debug!(fold, accuracy, "fold trained");
                Ok(accuracy)
            })
            .collect::<Result<Vec<f64>, TrainError>>()?;

        let result = CrossValidationResult::from_folds(fold_results);
        info!(
            mean_accuracy = result.mean_accuracy,
            std_deviation = result.std_deviation,
            "cross-validation complete"
        );
        Ok(result)
    }

    /// Grid search over every combination in `grid`.
    ///
    /// Each combination overrides `base` and trains a fresh model; the best
    /// is the highest final accuracy, ties going to the earliest.
    ///
    /// # Errors
    ///
    /// Returns [`TrainError::EmptyGrid`], a setter error for an invalid
    /// grid value, or any training error.
    #[instrument(skip_all, fields(n_samples = dataset.len()))]
    pub fn tune_hyperparameters(
        &self,
        dataset: &[Sample],
        base: &ModelTrainingConfig,
        grid: &HyperparameterGrid,
    ) -> Result<HyperparameterTuningResult, TrainError> {
        let combinations = grid.combinations()?;
        info!(n_combinations = combinations.len(), "starting grid search");

        let all_results = combinations
            .into_par_iter()
            .map(|hyperparameters| -> Result<TuningRun, TrainError> {
                let config = hyperparameters
                    .iter()
                    .try_fold(base.clone(), |config, &param| config.apply(param))?;
                let (_, history, _) = run(&self.template, dataset, &config)?;
                let (accuracy, loss) = history
                    .last()
                    .map_or((0.0, f64::INFINITY), |m| (m.accuracy, m.validation_loss));
                debug!(?hyperparameters, accuracy, loss, "combination trained");
                Ok(TuningRun {
                    hyperparameters,
                    accuracy,
                    loss,
                })
            })
            .collect::<Result<Vec<TuningRun>, TrainError>>()?;

        let mut best = 0;
        for (i, candidate) in all_results.iter().enumerate().skip(1) {
            if candidate.accuracy > all_results[best].accuracy {
                best = i;
            }
        }
        let winner = &all_results[best];
        info!(best_accuracy = winner.accuracy, "grid search complete");
        Ok(HyperparameterTuningResult {
            best_hyperparameters: winner.hyperparameters.clone(),
            best_accuracy: winner.accuracy,
            best_loss: winner.loss,
            all_results,
        })
    }
}

/// Validate `dataset` against the template's arity.
fn validate(dataset: &[Sample], n_features: usize) -> Result<(), TrainError> {
    if dataset.is_empty() {
        return Err(TrainError::EmptyDataset);
    }
    for (sample_index, sample) in dataset.iter().enumerate() {
        if sample.features.len() != n_features {
            return Err(TrainError::FeatureCountMismatch {
                expected: n_features,
                got: sample.features.len(),
                sample_index,
            });
        }
        if !sample.label.is_finite() {
            return Err(TrainError::NonFiniteLabel { sample_index });
        }
    }
    Ok(())
}

/// One full training run on a copy of `template`.
fn run<M: TrainableModel>(
    template: &M,
    dataset: &[Sample],
    config: &ModelTrainingConfig,
) -> Result<(M, Vec<TrainingMetrics>, BestEpoch), TrainError> {
    validate(dataset, template.n_features())?;

    // --- Split without shuffling across the boundary ---
    let n_samples = dataset.len();
    let split_index = (n_samples as f64 * (1.0 - config.validation_split)).floor() as usize;
    if split_index == 0 {
        return Err(TrainError::EmptyTrainingPartition {
            n_samples,
            validation_split: config.validation_split,
        });
    }
    let (training, validation) = dataset.split_at(split_index);
    let validation = if validation.is_empty() { training } else { validation };

    info!(
        n_train = training.len(),
        n_validation = validation.len(),
        epochs = config.epochs,
        batch_size = config.batch_size,
        "training model"
    );

    let mut model = template.clone();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut order: Vec<&Sample> = training.iter().collect();
    let n_batches = training.len().div_ceil(config.batch_size);
    let targets: Vec<f64> = validation.iter().map(Sample::target).collect();

    let mut history = Vec::with_capacity(config.epochs);
    let mut best: Option<BestEpoch> = None;
    for epoch in 0..config.epochs {
        order.shuffle(&mut rng);
        let mut epoch_loss = 0.0;
        for batch in order.chunks(config.batch_size) {
            epoch_loss +=
                model.train_batch(batch, config.learning_rate, config.regularization)?;
        }
        if !model.is_finite() {
            return Err(TrainError::Diverged { epoch });
        }
        let train_loss = epoch_loss / n_batches as f64;

        let validation_loss = model.loss(validation)?;
        let predictions = validation
            .iter()
            .map(|s| model.predict(&s.features))
            .collect::<Result<Vec<f64>, TrainError>>()?;
        let matrix = confusion_matrix(&predictions, &targets)?;

        if best.is_none_or(|b| validation_loss < b.validation_loss) {
            best = Some(BestEpoch {
                epoch,
                train_loss,
                validation_loss,
            });
        }
        debug!(epoch, train_loss, validation_loss, accuracy = matrix.accuracy(), "epoch complete");
        history.push(TrainingMetrics {
            epoch,
            train_loss,
            validation_loss,
            accuracy: matrix.accuracy(),
            precision: matrix.precision(),
            recall: matrix.recall(),
            f1_score: matrix.f1(),
        });
    }

    // epochs >= 1 is enforced by the config, so best is set
    let best = best.ok_or(TrainError::InvalidEpochs { epochs: 0 })?;
    info!(best_epoch = best.epoch, best_loss = best.validation_loss, "training complete");
    Ok((model, history, best))
}
