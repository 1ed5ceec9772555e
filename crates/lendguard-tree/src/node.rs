use std::fmt;

/// Position of a feature within a [`FeatureVector`](crate::FeatureVector).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position within the feature vector.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Slot of a node in a tree's arena; the root is slot 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in a regression tree arena.
///
/// Children are referenced by [`NodeIndex`] into the owning tree's
/// `Vec<Node>`. Interior nodes keep the mean target of the samples that
/// reached them so traversal can fall back to it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// Routes samples by one feature.
    Split {
        feature: FeatureIndex,
        /// Samples with `value <= threshold` go left.
        threshold: f64,
        left: NodeIndex,
        right: NodeIndex,
        /// Mean target of the samples that reached this node.
        mean: f64,
        n_samples: usize,
        /// Sample-weighted reduction in squared error from this split.
        variance_decrease: f64,
    },
    /// A terminal leaf node.
    Leaf {
        /// Mean target of the samples in this leaf.
        mean: f64,
        n_samples: usize,
    },
}

impl Node {
    /// Return the mean target stored at this node.
    #[must_use]
    pub fn mean(&self) -> f64 {
        match self {
            Node::Split { mean, .. } | Node::Leaf { mean, .. } => *mean,
        }
    }

    /// Training samples routed through this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// A node in an isolation tree arena.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum IsolationNode {
    /// A random axis-aligned cut. Values `< split_value` go left.
    Split {
        /// Randomly chosen feature.
        feature: FeatureIndex,
        /// Cut point drawn uniformly from the feature's observed range.
        split_value: f64,
        left: NodeIndex,
        right: NodeIndex,
    },
    /// An external node holding the number of samples that reached it.
    Leaf {
        /// Population size at this leaf.
        size: usize,
    },
}

impl IsolationNode {
    /// Whether this is an external node.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, IsolationNode::Leaf { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_index_orders_and_prints() {
        assert_eq!(format!("{}", FeatureIndex::new(3)), "3");
        assert!(FeatureIndex::new(1) < FeatureIndex::new(5));
    }

    #[test]
    fn node_index_exposes_slot() {
        assert_eq!(NodeIndex::new(42).index(), 42);
    }

    #[test]
    fn split_and_leaf_accessors() {
        let leaf = Node::Leaf { mean: 12.5, n_samples: 4 };
        let split = Node::Split {
            feature: FeatureIndex::new(2),
            threshold: 3.5,
            left: NodeIndex::new(1),
            right: NodeIndex::new(2),
            mean: 40.0,
            n_samples: 20,
            variance_decrease: 16.0,
        };
        assert!(leaf.is_leaf());
        assert!(!split.is_leaf());
        assert_eq!(leaf.n_samples(), 4);
        assert!((split.mean() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn isolation_leaf_is_leaf() {
        assert!(IsolationNode::Leaf { size: 3 }.is_leaf());
    }
}
