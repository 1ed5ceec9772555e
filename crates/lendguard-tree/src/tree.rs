use tracing::{debug, instrument};

use crate::{
    TreeError,
    feature::{FeatureVector, common_arity},
    node::{Node, NodeIndex},
    split::find_best_split,
};

/// Configuration for a single regression tree.
///
/// # Defaults
///
/// | Parameter   | Default |
/// |-------------|---------|
/// | `max_depth` | 10      |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) max_depth: usize,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self { max_depth: 10 }
    }

    /// Set the maximum tree depth (root is depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Return the maximum depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Grow a regression tree by recursive variance reduction.
    ///
    /// Recursion stops at `max_depth`, at nodes with one sample, or when no
    /// threshold reduces variance; such nodes become leaves holding the mean
    /// target. An empty dataset yields a single leaf with mean 0.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::TargetCountMismatch`] | `features.len() != targets.len()` |
    /// | [`TreeError::FeatureCountMismatch`] | rows have inconsistent lengths |
    /// | [`TreeError::NonFiniteTarget`] | any target is NaN or infinite |
    /// | [`TreeError::InvalidMaxDepth`] | `max_depth` is 0 |
    #[instrument(skip(self, features, targets), fields(n_samples = features.len()))]
    pub fn fit(&self, features: &[FeatureVector], targets: &[f64]) -> Result<DecisionTree, TreeError> {
        // --- Validate inputs ---
        if features.len() != targets.len() {
            return Err(TreeError::TargetCountMismatch {
                n_samples: features.len(),
                n_targets: targets.len(),
            });
        }
        let n_features = common_arity(features)?;
        if let Some(sample_index) = targets.iter().position(|t| !t.is_finite()) {
            return Err(TreeError::NonFiniteTarget { sample_index });
        }

        // --- Validate config ---
        if self.max_depth == 0 {
            return Err(TreeError::InvalidMaxDepth { max_depth: 0 });
        }

        let n_samples = features.len();
        if n_samples == 0 {
            return Ok(DecisionTree {
                nodes: vec![Node::Leaf { mean: 0.0, n_samples: 0 }],
                n_features: 0,
            });
        }

        let col_features: Vec<Vec<f64>> = (0..n_features)
            .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
            .collect();
        let sample_indices: Vec<usize> = (0..n_samples).collect();
        let mut arena: Vec<Node> = Vec::new();

        build_tree(&col_features, targets, &sample_indices, self.max_depth, 0, &mut arena);

        debug!(n_nodes = arena.len(), n_features, "regression tree built");

        Ok(DecisionTree {
            nodes: arena,
            n_features,
        })
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively build the arena; returns the index of the node just created.
fn build_tree(
    col_features: &[Vec<f64>],
    targets: &[f64],
    sample_indices: &[usize],
    max_depth: usize,
    depth: usize,
    arena: &mut Vec<Node>,
) -> NodeIndex {
    let n_samples = sample_indices.len();
    let mean = sample_indices.iter().map(|&si| targets[si]).sum::<f64>() / n_samples as f64;

    let split = if depth >= max_depth {
        None
    } else {
        find_best_split(col_features, targets, sample_indices)
    };

    let Some(split) = split else {
        arena.push(Node::Leaf { mean, n_samples });
        return NodeIndex::new(arena.len() - 1);
    };

    // Reserve the slot so children get higher indices, then overwrite.
    let node_idx = arena.len();
    arena.push(Node::Leaf { mean, n_samples });

    let left = build_tree(col_features, targets, &split.left_indices, max_depth, depth + 1, arena);
    let right = build_tree(col_features, targets, &split.right_indices, max_depth, depth + 1, arena);

    arena[node_idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
        mean,
        n_samples,
        variance_decrease: split.gain * n_samples as f64,
    };

    NodeIndex::new(node_idx)
}

/// A fitted regression tree stored as a node arena rooted at index 0.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
}

impl DecisionTree {
    /// Build a tree with the default configuration.
    ///
    /// # Errors
    ///
    /// See [`DecisionTreeConfig::fit`].
    pub fn build(features: &[FeatureVector], targets: &[f64]) -> Result<Self, TreeError> {
        DecisionTreeConfig::new().fit(features, targets)
    }

    /// Predict the target for a single sample.
    ///
    /// Descends left while `sample[feature] <= threshold`. A tree built from
    /// an empty dataset returns 0 for any input.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when the sample arity
    /// differs from the training arity.
    pub fn predict(&self, sample: &FeatureVector) -> Result<f64, TreeError> {
        if self.is_vacuous() {
            return Ok(0.0);
        }
        if sample.len() != self.n_features {
            return Err(TreeError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { mean, .. } => return Ok(*mean),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Accumulated variance decrease per feature, normalized to sum to 1.
    ///
    /// All zeros when the tree is a single leaf.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut totals = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature,
                variance_decrease,
                ..
            } = node
            {
                totals[feature.index()] += variance_decrease;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            totals.iter_mut().for_each(|v| *v /= sum);
        }
        totals
    }

    /// Return the number of features the tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the total number of nodes (splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth; a single root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((node_idx, d)) = stack.pop() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((left.index(), d + 1));
                    stack.push((right.index(), d + 1));
                }
            }
        }
        max_depth
    }

    /// Return the node arena, root first.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn is_vacuous(&self) -> bool {
        self.nodes.first().is_some_and(|n| n.n_samples() == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[f64]]) -> Vec<FeatureVector> {
        raw.iter()
            .map(|r| FeatureVector::new(r.to_vec()).unwrap())
            .collect()
    }

    fn fv(values: &[f64]) -> FeatureVector {
        FeatureVector::new(values.to_vec()).unwrap()
    }

    #[test]
    fn empty_dataset_yields_zero_leaf() {
        let tree = DecisionTree::build(&[], &[]).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.predict(&fv(&[1.0, 2.0])).unwrap(), 0.0);
    }

    #[test]
    fn single_sample_predicts_its_target() {
        let tree = DecisionTree::build(&rows(&[&[3.0, 4.0]]), &[42.0]).unwrap();
        assert_eq!(tree.n_nodes(), 1);
        for query in [[0.0, 0.0], [100.0, -5.0], [3.0, 4.0]] {
            assert_eq!(tree.predict(&fv(&query)).unwrap(), 42.0);
        }
    }

    #[test]
    fn zero_length_vectors_give_mean_leaf() {
        let features = rows(&[&[], &[], &[]]);
        let tree = DecisionTree::build(&features, &[10.0, 20.0, 30.0]).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert!((tree.predict(&fv(&[])).unwrap() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn separable_data_is_fit_exactly() {
        let features = rows(&[&[1.0, 0.0], &[2.0, 0.0], &[3.0, 0.0], &[10.0, 0.0], &[11.0, 0.0]]);
        let targets = [10.0, 10.0, 10.0, 80.0, 80.0];
        let tree = DecisionTree::build(&features, &targets).unwrap();
        assert_eq!(tree.predict(&fv(&[2.5, 0.0])).unwrap(), 10.0);
        assert_eq!(tree.predict(&fv(&[50.0, 0.0])).unwrap(), 80.0);
        match &tree.nodes()[0] {
            Node::Split { feature, threshold, .. } => {
                assert_eq!(feature.index(), 0);
                assert_eq!(*threshold, 3.0);
            }
            Node::Leaf { .. } => panic!("root should split"),
        }
    }

    #[test]
    fn threshold_is_inclusive_on_the_left() {
        let features = rows(&[&[1.0], &[2.0]]);
        let tree = DecisionTree::build(&features, &[0.0, 100.0]).unwrap();
        assert_eq!(tree.predict(&fv(&[1.0])).unwrap(), 0.0);
        assert_eq!(tree.predict(&fv(&[1.5])).unwrap(), 100.0);
    }

    #[test]
    fn predicting_training_samples_never_fails() {
        let features: Vec<FeatureVector> = (0..40)
            .map(|i| fv(&[(i * 7 % 13) as f64, (i % 5) as f64, i as f64]))
            .collect();
        let targets: Vec<f64> = (0..40).map(|i| ((i * 31) % 100) as f64).collect();
        let tree = DecisionTree::build(&features, &targets).unwrap();
        for row in &features {
            let pred = tree.predict(row).unwrap();
            assert!((0.0..=99.0).contains(&pred), "pred = {pred}");
        }
    }

    #[test]
    fn max_depth_limits_tree() {
        let features: Vec<FeatureVector> = (0..64).map(|i| fv(&[i as f64])).collect();
        let targets: Vec<f64> = (0..64).map(|i| (i * i) as f64).collect();
        let tree = DecisionTreeConfig::new()
            .with_max_depth(3)
            .fit(&features, &targets)
            .unwrap();
        assert!(tree.depth() <= 3);
        let full = DecisionTree::build(&features, &targets).unwrap();
        assert!(full.depth() <= 10);
    }

    #[test]
    fn feature_importances_sum_to_one() {
        let features = rows(&[&[1.0, 100.0], &[2.0, 200.0], &[10.0, 100.0], &[11.0, 200.0]]);
        let tree = DecisionTree::build(&features, &[0.0, 5.0, 90.0, 95.0]).unwrap();
        let importances = tree.feature_importances();
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10, "sum = {sum}");
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn prediction_feature_mismatch() {
        let tree = DecisionTree::build(&rows(&[&[1.0, 2.0], &[3.0, 4.0]]), &[0.0, 1.0]).unwrap();
        let err = tree.predict(&fv(&[1.0])).unwrap_err();
        assert!(matches!(
            err,
            TreeError::PredictionFeatureMismatch { expected: 2, got: 1 }
        ));
    }

    #[test]
    fn target_count_mismatch_error() {
        let err = DecisionTree::build(&rows(&[&[1.0]]), &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, TreeError::TargetCountMismatch { .. }));
    }

    #[test]
    fn non_finite_target_error() {
        let err = DecisionTree::build(&rows(&[&[1.0], &[2.0]]), &[1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, TreeError::NonFiniteTarget { sample_index: 1 }));
    }

    #[test]
    fn zero_max_depth_is_rejected() {
        let err = DecisionTreeConfig::new()
            .with_max_depth(0)
            .fit(&rows(&[&[1.0]]), &[1.0])
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }
}
