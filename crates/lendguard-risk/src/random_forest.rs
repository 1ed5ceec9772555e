//! Bagged regression trees.

use lendguard_tree::{DecisionTree, DecisionTreeConfig, FeatureVector};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::{
    RiskError,
    model::{ModelKind, RiskModel, check_arity, validate_training_set},
};

/// Prediction of a forest that has not been trained.
const UNTRAINED_PREDICTION: f64 = 50.0;

/// A bagged ensemble of regression trees.
///
/// # Defaults
///
/// | Parameter   | Default |
/// |-------------|---------|
/// | `n_trees`   | 50      |
/// | `max_depth` | 10      |
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForestRegressor {
    n_trees: usize,
    max_depth: usize,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForestRegressor {
    /// Create an untrained forest over `n_features` inputs.
    #[must_use]
    pub fn new(n_features: usize) -> Self {
        Self {
            n_trees: 50,
            max_depth: 10,
            n_features,
            trees: Vec::new(),
        }
    }

    /// Set the number of trees grown by the next [`RiskModel::train`] call.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::InvalidTreeCount`] when `n_trees` is 0.
    pub fn with_n_trees(mut self, n_trees: usize) -> Result<Self, RiskError> {
        if n_trees == 0 {
            return Err(RiskError::InvalidTreeCount { n_trees });
        }
        self.n_trees = n_trees;
        Ok(self)
    }

    /// Set the per-tree depth cap.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    // --- Getters ---

    /// Return the configured number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Whether the forest holds trained trees.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Mean of per-tree importances; uniform when untrained.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        if self.trees.is_empty() || self.n_features == 0 {
            return vec![1.0 / self.n_features.max(1) as f64; self.n_features];
        }
        let mut totals = vec![0.0f64; self.n_features];
        for tree in &self.trees {
            for (total, imp) in totals.iter_mut().zip(tree.feature_importances()) {
                *total += imp;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        } else {
            // every tree is a single leaf
            totals.fill(1.0 / self.n_features as f64);
        }
        totals
    }
}

impl RiskModel for RandomForestRegressor {
    fn kind(&self) -> ModelKind {
        ModelKind::RandomForest
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: &FeatureVector) -> Result<f64, RiskError> {
        check_arity(x, self.n_features)?;
        if self.trees.is_empty() {
            return Ok(UNTRAINED_PREDICTION);
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.predict(x)?;
        }
        Ok((sum / self.trees.len() as f64).clamp(0.0, 100.0))
    }

    /// Grow every tree on its own with-replacement sample of `n` rows.
    ///
    /// Per-tree seeds are drawn from `rng` before the parallel section.
    #[instrument(skip_all, fields(n_trees = self.n_trees, n_samples = features.len()))]
    fn train(
        &mut self,
        features: &[FeatureVector],
        targets: &[f64],
        rng: &mut dyn RngCore,
    ) -> Result<(), RiskError> {
        validate_training_set(features, targets, self.n_features)?;
        let n_samples = features.len();

        info!(n_trees = self.n_trees, n_samples, "training random forest");

        let tree_config = DecisionTreeConfig::new().with_max_depth(self.max_depth);
        let tree_seeds: Vec<u64> = (0..self.n_trees).map(|_| rng.next_u64()).collect();
        let trees = tree_seeds
            .into_par_iter()
            .map(|seed| {
                let mut tree_rng = ChaCha8Rng::seed_from_u64(seed);
                let mut boot_features = Vec::with_capacity(n_samples);
                let mut boot_targets = Vec::with_capacity(n_samples);
                for _ in 0..n_samples {
                    let idx = tree_rng.gen_range(0..n_samples);
                    boot_features.push(features[idx].clone());
                    boot_targets.push(targets[idx]);
                }
                tree_config.fit(&boot_features, &boot_targets)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(n_trees_trained = trees.len(), "random forest complete");
        self.trees = trees;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(values: &[f64]) -> FeatureVector {
        FeatureVector::new(values.to_vec()).unwrap()
    }

    fn step_data() -> (Vec<FeatureVector>, Vec<f64>) {
        let mut features = Vec::new();
        let mut targets = Vec::new();
        for i in 0..60 {
            let x = i as f64;
            features.push(fv(&[x, 50.0]));
            targets.push(if x < 30.0 { 10.0 } else { 90.0 });
        }
        (features, targets)
    }

    #[test]
    fn untrained_forest_is_neutral() {
        let forest = RandomForestRegressor::new(2);
        assert!(!forest.is_trained());
        assert_eq!(forest.predict(&fv(&[1.0, 2.0])).unwrap(), 50.0);
        assert_eq!(forest.feature_importances(), vec![0.5, 0.5]);
    }

    #[test]
    fn trained_forest_learns_step() {
        let (features, targets) = step_data();
        let mut forest = RandomForestRegressor::new(2).with_n_trees(20).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        forest.train(&features, &targets, &mut rng).unwrap();

        assert!(forest.predict(&fv(&[5.0, 50.0])).unwrap() < 30.0);
        assert!(forest.predict(&fv(&[55.0, 50.0])).unwrap() > 70.0);
        let imp = forest.feature_importances();
        assert!(imp[0] > 0.9);
    }

    #[test]
    fn same_seed_same_forest() {
        let (features, targets) = step_data();
        let query = fv(&[29.5, 50.0]);
        let run = |seed| {
            let mut forest = RandomForestRegressor::new(2).with_n_trees(10).unwrap();
            forest
                .train(&features, &targets, &mut ChaCha8Rng::seed_from_u64(seed))
                .unwrap();
            forest.predict(&query).unwrap()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn failed_train_keeps_previous_trees() {
        let (features, targets) = step_data();
        let mut forest = RandomForestRegressor::new(2).with_n_trees(5).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        forest.train(&features, &targets, &mut rng).unwrap();
        let before = forest.predict(&fv(&[5.0, 50.0])).unwrap();

        let err = forest.train(&features, &targets[..3], &mut rng).unwrap_err();
        assert!(matches!(err, RiskError::TargetCountMismatch { .. }));
        assert_eq!(forest.predict(&fv(&[5.0, 50.0])).unwrap(), before);
    }

    #[test]
    fn rejects_wrong_arity_and_zero_trees() {
        let forest = RandomForestRegressor::new(3);
        assert!(matches!(
            forest.predict(&fv(&[1.0])),
            Err(RiskError::DimensionMismatch { expected: 3, got: 1 })
        ));
        assert!(RandomForestRegressor::new(3).with_n_trees(0).is_err());
    }
}
