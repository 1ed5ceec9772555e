//! Transaction anomaly detection for the lendguard engine.
//!
//! Blends four detectors into one verdict: a z-score on the transaction
//! amount, an isolation forest over normalized features, a local outlier
//! factor against the training history, and a rule-based statistical score.
//! [`TransactionScreen`] is a separate additive rule screen for transfers.

mod detector;
mod error;
mod forest;
mod input;
mod lof;
mod score;
mod screen;
mod statistical;
mod zscore;

pub use detector::{AnomalyDetector, BaselineStats};
pub use error::AnomalyError;
pub use forest::{IsolationForest, IsolationForestConfig};
pub use input::{AnomalyInput, NORMALIZED_DIMENSIONS};
pub use lof::{LocalOutlierFactor, LofMode};
pub use score::{AlgorithmScores, AnomalyScore, Severity, SuggestedAction};
pub use screen::{FraudAnalysis, ScreenInput, ScreenRecommendation, TransactionScreen};
pub use statistical::StatisticalDetector;
pub use zscore::ZScoreDetector;
