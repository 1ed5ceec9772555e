//! Tree primitives for the lendguard engine.
//!
//! Provides the validated [`FeatureVector`] shared by every model, an
//! arena-based regression tree grown by variance reduction, and randomized
//! isolation trees for anomaly scoring.

mod error;
mod feature;
mod isolation;
mod node;
mod split;
mod tree;

pub use error::{ErrorKind, TreeError};
pub use feature::FeatureVector;
pub use isolation::{EULER_GAMMA, IsolationTree, average_path_length};
pub use node::{FeatureIndex, IsolationNode, Node, NodeIndex};
pub use tree::{DecisionTree, DecisionTreeConfig};
