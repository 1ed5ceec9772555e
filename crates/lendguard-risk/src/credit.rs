//! Credit scoring on the 300–850 scale.

use std::collections::HashSet;

use lendguard_tree::FeatureVector;
use rand::{Rng, RngCore};
use tracing::{debug, instrument};

use crate::{NeuralNetwork, RiskError, model::RiskModel};

const MIN_SCORE: f64 = 300.0;
const MAX_SCORE: f64 = 850.0;
/// Points on the credit scale per blended factor point.
const SCALE_PER_POINT: f64 = 5.5;
const FACTOR_WEIGHTS: [f64; 5] = [0.35, 0.25, 0.15, 0.15, 0.10];
const FULL_REPUTATION_POINTS: f64 = 150.0;
const DEFAULT_PENALTY: f64 = 15.0;

/// Lifecycle state of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Active,
    Repaid,
    Defaulted,
}

/// One loan in a borrower's history.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoanRecord {
    pub status: LoanStatus,
    pub amount: f64,
    pub outstanding_amount: f64,
    pub chain: String,
}

/// Everything the scorer needs to know about a borrower.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreditProfile {
    #[serde(default)]
    pub loans: Vec<LoanRecord>,
    pub account_age_months: f64,
    pub reputation_points: f64,
}

impl CreditProfile {
    fn validate(&self) -> Result<(), RiskError> {
        if !self.account_age_months.is_finite() {
            return Err(RiskError::NonFiniteField {
                field: "account_age_months",
            });
        }
        if !self.reputation_points.is_finite() {
            return Err(RiskError::NonFiniteField {
                field: "reputation_points",
            });
        }
        for loan in &self.loans {
            if !loan.amount.is_finite() {
                return Err(RiskError::NonFiniteField { field: "amount" });
            }
            if !loan.outstanding_amount.is_finite() {
                return Err(RiskError::NonFiniteField {
                    field: "outstanding_amount",
                });
            }
        }
        Ok(())
    }
}

/// Factor scores in `[0, 100]` plus the model adjustment.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CreditFactors {
    pub payment_history: f64,
    pub loan_utilization: f64,
    pub account_age: f64,
    pub reputation: f64,
    pub diversification: f64,
    pub ai_adjustment: f64,
}

impl CreditFactors {
    /// Derive the five factor scores; `ai_adjustment` starts at 0.
    fn from_profile(profile: &CreditProfile) -> Self {
        Self {
            payment_history: payment_history(&profile.loans),
            loan_utilization: loan_utilization(&profile.loans),
            account_age: account_age(profile.account_age_months),
            reputation: (profile.reputation_points / FULL_REPUTATION_POINTS * 100.0)
                .clamp(0.0, 100.0),
            diversification: diversification(&profile.loans),
            ai_adjustment: 0.0,
        }
    }

    fn as_array(&self) -> [f64; 5] {
        [
            self.payment_history,
            self.loan_utilization,
            self.account_age,
            self.reputation,
            self.diversification,
        ]
    }
}

fn payment_history(loans: &[LoanRecord]) -> f64 {
    if loans.is_empty() {
        return 50.0;
    }
    let repaid = loans.iter().filter(|l| l.status == LoanStatus::Repaid).count();
    let defaulted = loans.iter().filter(|l| l.status == LoanStatus::Defaulted).count();
    let repayment_rate = repaid as f64 / loans.len() as f64;
    (repayment_rate * 100.0 - defaulted as f64 * DEFAULT_PENALTY).clamp(0.0, 100.0)
}

fn loan_utilization(loans: &[LoanRecord]) -> f64 {
    let active: Vec<&LoanRecord> = loans
        .iter()
        .filter(|l| l.status == LoanStatus::Active)
        .collect();
    if active.is_empty() {
        return 100.0;
    }
    let borrowed: f64 = active.iter().map(|l| l.amount).sum();
    let outstanding: f64 = active.iter().map(|l| l.outstanding_amount).sum();
    let denominator = if borrowed == 0.0 { 1.0 } else { borrowed };
    let utilization = outstanding / denominator * 100.0;
    match utilization {
        u if u < 30.0 => 100.0,
        u if u < 50.0 => 80.0,
        u if u < 70.0 => 60.0,
        _ => 40.0,
    }
}

fn account_age(months: f64) -> f64 {
    match months {
        m if m < 1.0 => 20.0,
        m if m < 3.0 => 40.0,
        m if m < 6.0 => 60.0,
        m if m < 12.0 => 80.0,
        _ => 100.0,
    }
}

fn diversification(loans: &[LoanRecord]) -> f64 {
    if loans.is_empty() {
        return 50.0;
    }
    let chains: HashSet<&str> = loans.iter().map(|l| l.chain.as_str()).collect();
    (chains.len() as f64 / 3.0 * 100.0).min(100.0)
}

/// Letter grade for a credit score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    F,
}

impl Grade {
    /// Grade boundaries at 800, 750, 700, 650, 600, 550 and 500.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 800.0 => Grade::APlus,
            s if s >= 750.0 => Grade::A,
            s if s >= 700.0 => Grade::BPlus,
            s if s >= 650.0 => Grade::B,
            s if s >= 600.0 => Grade::CPlus,
            s if s >= 550.0 => Grade::C,
            s if s >= 500.0 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(label)
    }
}

/// A scored credit profile.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreditScoreResult {
    pub score: f64,
    pub grade: Grade,
    pub factors: CreditFactors,
    pub recommendations: Vec<String>,
}

/// Blends factor scores with a small neural network adjustment.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreditScorer {
    model: NeuralNetwork,
}

impl CreditScorer {
    /// Create a scorer whose adjustment network is initialized from `rng`.
    ///
    /// # Errors
    ///
    /// Propagates network construction errors.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Result<Self, RiskError> {
        Ok(Self {
            model: NeuralNetwork::new(FACTOR_WEIGHTS.len(), rng)?,
        })
    }

    /// Score a profile.
    ///
    /// The network sees the factors scaled to `[0, 1]`; its output maps to
    /// an adjustment of `round((p - 50) / 2)`. The weighted factor blend plus
    /// the adjustment is mapped onto the credit scale as
    /// `clamp(round(300 + 5.5 * blend), 300, 850)`.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::NonFiniteField`] for non-finite profile numbers.
    pub fn score(&self, profile: &CreditProfile) -> Result<CreditScoreResult, RiskError> {
        profile.validate()?;
        let mut factors = CreditFactors::from_profile(profile);
        let prediction = self.model.predict(&model_input(&factors)?)?;
        factors.ai_adjustment = ((prediction - 50.0) / 2.0).round();

        let blend: f64 = factors
            .as_array()
            .iter()
            .zip(FACTOR_WEIGHTS)
            .map(|(f, w)| f * w)
            .sum::<f64>()
            + factors.ai_adjustment;
        let score = (MIN_SCORE + SCALE_PER_POINT * blend)
            .round()
            .clamp(MIN_SCORE, MAX_SCORE);

        debug!(score, blend, "credit profile scored");
        Ok(CreditScoreResult {
            score,
            grade: Grade::from_score(score),
            recommendations: recommendations(score, &factors),
            factors,
        })
    }

    /// Fit the adjustment network to observed outcomes in `[0, 100]`.
    ///
    /// # Errors
    ///
    /// Returns profile validation errors or the network's training error.
    #[instrument(skip_all, fields(n_profiles = profiles.len()))]
    pub fn train(
        &mut self,
        profiles: &[CreditProfile],
        targets: &[f64],
        rng: &mut dyn RngCore,
    ) -> Result<(), RiskError> {
        let inputs = profiles
            .iter()
            .map(|p| {
                p.validate()?;
                model_input(&CreditFactors::from_profile(p))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.model.train(&inputs, targets, rng)
    }
}

fn model_input(factors: &CreditFactors) -> Result<FeatureVector, RiskError> {
    Ok(FeatureVector::new(
        factors.as_array().iter().map(|f| f / 100.0).collect(),
    )?)
}

fn recommendations(score: f64, factors: &CreditFactors) -> Vec<String> {
    let rules = [
        (
            factors.payment_history < 70.0,
            "Make on-time payments to improve your payment history",
        ),
        (
            factors.loan_utilization < 60.0,
            "Reduce your active loan balance to improve utilization ratio",
        ),
        (
            factors.reputation < 60.0,
            "Complete learning quests to earn reputation points",
        ),
        (
            factors.diversification < 50.0,
            "Diversify across multiple chains to improve your profile",
        ),
        (
            score < 650.0,
            "Consider starting with smaller loans to build credit history",
        ),
    ];
    rules
        .iter()
        .filter(|(applies, _)| *applies)
        .map(|(_, text)| (*text).to_string())
        .collect()
}
