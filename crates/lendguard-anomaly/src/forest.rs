//! Isolation forest training with parallel tree construction.

use lendguard_tree::{FeatureVector, IsolationTree, average_path_length};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::AnomalyError;

/// Configuration for an isolation forest.
///
/// Construct via [`IsolationForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter     | Default |
/// |---------------|---------|
/// | `n_trees`     | 100     |
/// | `max_samples` | 256     |
#[derive(Debug, Clone)]
pub struct IsolationForestConfig {
    n_trees: usize,
    max_samples: usize,
}

impl IsolationForestConfig {
    /// Create a config with `n_trees` trees.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError::InvalidTreeCount`] when `n_trees` is 0.
    pub fn new(n_trees: usize) -> Result<Self, AnomalyError> {
        if n_trees == 0 {
            return Err(AnomalyError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_samples: 256,
        })
    }

    /// Set the per-tree bootstrap size cap.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError::InvalidSampleSize`] when `max_samples` is 0.
    pub fn with_max_samples(mut self, max_samples: usize) -> Result<Self, AnomalyError> {
        if max_samples == 0 {
            return Err(AnomalyError::InvalidSampleSize { max_samples });
        }
        self.max_samples = max_samples;
        Ok(self)
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the bootstrap size cap.
    #[must_use]
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Train a forest on `data`.
    ///
    /// Each tree is built from a with-replacement sample of
    /// `min(max_samples, data.len())` rows. Per-tree seeds are drawn from
    /// `rng` up front, so the result is independent of thread scheduling.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AnomalyError::EmptyHistory`] | `data` is empty |
    /// | [`AnomalyError::DimensionMismatch`] | rows have inconsistent lengths |
    #[instrument(skip_all, fields(n_trees = self.n_trees, n_samples = data.len()))]
    pub fn fit<R: Rng + ?Sized>(
        &self,
        data: &[FeatureVector],
        rng: &mut R,
    ) -> Result<IsolationForest, AnomalyError> {
        if data.is_empty() {
            return Err(AnomalyError::EmptyHistory);
        }
        let n_features = data[0].len();
        if let Some(row) = data.iter().find(|row| row.len() != n_features) {
            return Err(AnomalyError::DimensionMismatch {
                expected: n_features,
                got: row.len(),
            });
        }
        let sample_size = self.max_samples.min(data.len());

        info!(n_trees = self.n_trees, sample_size, n_features, "training isolation forest");

        let tree_seeds: Vec<u64> = (0..self.n_trees).map(|_| rng.r#gen()).collect();
        let trees = tree_seeds
            .into_par_iter()
            .map(|seed| {
                let mut tree_rng = ChaCha8Rng::seed_from_u64(seed);
                let sample: Vec<FeatureVector> = (0..sample_size)
                    .map(|_| data[tree_rng.gen_range(0..data.len())].clone())
                    .collect();
                IsolationTree::build(&sample, &mut tree_rng)
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(n_trees_trained = trees.len(), "isolation forest complete");

        Ok(IsolationForest {
            trees,
            sample_size,
            n_features,
        })
    }
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
        }
    }
}

/// A trained isolation forest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    n_features: usize,
}

impl IsolationForest {
    /// Score a point in `[0, 100]` as `2^(-E[h(x)] / c(n)) * 100`.
    ///
    /// `n` is the per-tree sample size. With `n <= 1` the normalizer is 0
    /// and the score is 0.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError::DimensionMismatch`] on arity mismatch.
    pub fn score(&self, point: &FeatureVector) -> Result<f64, AnomalyError> {
        if point.len() != self.n_features {
            return Err(AnomalyError::DimensionMismatch {
                expected: self.n_features,
                got: point.len(),
            });
        }
        let c = average_path_length(self.sample_size);
        if c == 0.0 {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.path_length(point)?;
        }
        let avg = total / self.trees.len() as f64;
        Ok((2f64.powf(-avg / c) * 100.0).clamp(0.0, 100.0))
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the per-tree sample size used for normalization.
    #[must_use]
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Return the feature arity.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
