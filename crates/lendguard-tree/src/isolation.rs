//! Randomized isolation trees.

use rand::Rng;
use tracing::{debug, instrument};

use crate::{
    TreeError,
    feature::{FeatureVector, common_arity},
    node::{FeatureIndex, IsolationNode, NodeIndex},
};

/// Euler-Mascheroni constant used in the harmonic-number approximation.
pub const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Average path length of an unsuccessful BST search over `n` points.
///
/// `c(n) = 2(ln(n-1) + γ) - 2(n-1)/n`, and `c(n) = 0` for `n <= 1`.
#[must_use]
pub fn average_path_length(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    let m = n as f64;
    2.0 * ((m - 1.0).ln() + EULER_GAMMA) - 2.0 * (m - 1.0) / m
}

/// Path-length credit for a leaf still holding `size` points.
fn leaf_adjustment(size: usize) -> f64 {
    if size <= 1 {
        0.0
    } else {
        ((size - 1) as f64).ln() + EULER_GAMMA
    }
}

/// A single isolation tree built from one sample of the data.
///
/// Depth is capped at `ceil(log2(max(n, 2)))` where `n` is the size of the
/// sample the tree was built from.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IsolationTree {
    nodes: Vec<IsolationNode>,
    n_features: usize,
    max_depth: usize,
}

impl IsolationTree {
    /// Build a tree by recursive random axis-aligned cuts.
    ///
    /// At each node a feature is drawn uniformly, then a cut point uniformly
    /// from that feature's observed `[min, max)`. Values `< cut` go left.
    /// A node becomes a leaf at the depth cap, with one sample or fewer, or
    /// when the chosen feature is constant.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::EmptySample`] | `samples` is empty |
    /// | [`TreeError::FeatureCountMismatch`] | rows have inconsistent lengths |
    #[instrument(skip_all, fields(n_samples = samples.len()))]
    pub fn build<R: Rng + ?Sized>(samples: &[FeatureVector], rng: &mut R) -> Result<Self, TreeError> {
        if samples.is_empty() {
            return Err(TreeError::EmptySample);
        }
        let n_features = common_arity(samples)?;
        let max_depth = (samples.len().max(2) as f64).log2().ceil() as usize;

        let indices: Vec<usize> = (0..samples.len()).collect();
        let mut arena = Vec::new();
        grow(samples, &indices, 0, max_depth, n_features, rng, &mut arena);

        debug!(n_nodes = arena.len(), max_depth, "isolation tree built");
        Ok(Self {
            nodes: arena,
            n_features,
            max_depth,
        })
    }

    /// Return the path length of `point`, including the leaf adjustment.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] on arity mismatch.
    pub fn path_length(&self, point: &FeatureVector) -> Result<f64, TreeError> {
        if point.len() != self.n_features {
            return Err(TreeError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: point.len(),
            });
        }
        let mut idx = 0usize;
        let mut depth = 0usize;
        loop {
            match &self.nodes[idx] {
                IsolationNode::Leaf { size } => return Ok(depth as f64 + leaf_adjustment(*size)),
                IsolationNode::Split {
                    feature,
                    split_value,
                    left,
                    right,
                } => {
                    idx = if point[feature.index()] < *split_value {
                        left.index()
                    } else {
                        right.index()
                    };
                    depth += 1;
                }
            }
        }
    }

    /// Return the depth cap used while building.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the feature arity the tree was built on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

fn grow<R: Rng + ?Sized>(
    samples: &[FeatureVector],
    indices: &[usize],
    depth: usize,
    max_depth: usize,
    n_features: usize,
    rng: &mut R,
    arena: &mut Vec<IsolationNode>,
) -> NodeIndex {
    let leaf = |arena: &mut Vec<IsolationNode>| {
        arena.push(IsolationNode::Leaf { size: indices.len() });
        NodeIndex::new(arena.len() - 1)
    };

    if depth >= max_depth || indices.len() <= 1 || n_features == 0 {
        return leaf(arena);
    }

    let feature = rng.gen_range(0..n_features);
    let (min, max) = indices
        .iter()
        .map(|&i| samples[i][feature])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min == max {
        return leaf(arena);
    }

    let split_value = min + rng.r#gen::<f64>() * (max - min);
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| samples[i][feature] < split_value);

    let node_idx = arena.len();
    arena.push(IsolationNode::Leaf { size: indices.len() });
    let left = grow(samples, &left_indices, depth + 1, max_depth, n_features, rng, arena);
    let right = grow(samples, &right_indices, depth + 1, max_depth, n_features, rng, arena);
    arena[node_idx] = IsolationNode::Split {
        feature: FeatureIndex::new(feature),
        split_value,
        left,
        right,
    };
    NodeIndex::new(node_idx)
}
