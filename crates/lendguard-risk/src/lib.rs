//! Risk scoring for the lendguard engine.
//!
//! Four regressors share the [`RiskModel`] trait and are blended by
//! [`RiskEnsemble`] into a risk score, a confidence from member agreement and
//! a recommended action. [`CreditScorer`] turns a borrower's loan history
//! into a 300–850 credit score. [`assess_loan`] rates an open collateralized
//! loan's default and liquidation risk with fixed rules.

mod assessment;
mod credit;
mod ensemble;
mod error;
mod gradient_boosting;
mod logistic;
mod model;
mod neural_net;
mod random_forest;

pub use assessment::{
    LoanPosition, LoanRiskAssessment, RiskFactors, RiskLevel, UNKNOWN_CREDIT_SCORE, assess_loan,
    chain_volatility, repayment_performance,
};
pub use credit::{
    CreditFactors, CreditProfile, CreditScoreResult, CreditScorer, Grade, LoanRecord, LoanStatus,
};
pub use ensemble::{
    ENSEMBLE_FEATURES, EnsembleInput, EnsemblePrediction, FeatureImportance, ModelScores,
    RecommendedAction, RiskEnsemble, combine,
};
pub use error::RiskError;
pub use gradient_boosting::GradientBoostingRegressor;
pub use lendguard_tree::FeatureVector;
pub use logistic::LogisticRegression;
pub use model::{ModelKind, RiskModel, validate_training_set};
pub use neural_net::NeuralNetwork;
pub use random_forest::RandomForestRegressor;
