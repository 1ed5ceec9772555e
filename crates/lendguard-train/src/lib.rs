//! Model training for the lendguard engine.
//!
//! [`Trainer`] fits any [`TrainableModel`] with seeded mini-batch gradient
//! descent, recording validation metrics per epoch. It also runs k-fold
//! cross-validation and grid searches over a [`HyperparameterGrid`].
//! Evaluation helpers and feature preprocessing live alongside.

mod config;
mod error;
mod evaluator;
mod metrics;
mod model;
mod preprocess;
mod trainer;

pub use config::{Hyperparameter, HyperparameterGrid, ModelTrainingConfig, Regularization};
pub use error::TrainError;
pub use evaluator::{BinaryConfusion, PrPoint, confusion_matrix, precision_recall_curve, roc_auc};
pub use lendguard_tree::FeatureVector;
pub use metrics::{
    BestEpoch, CrossValidationResult, HyperparameterTuningResult, TrainingMetrics,
    TrainingSummary, TuningRun,
};
pub use model::{LogisticClassifier, REGULARIZATION_STRENGTH, Sample, TrainableModel};
pub use preprocess::{
    DEFAULT_VARIANCE_THRESHOLD, MinMaxScaling, Standardization, interaction_features,
    min_max_normalize, polynomial_features, select_by_variance, standardize,
};
pub use trainer::Trainer;
