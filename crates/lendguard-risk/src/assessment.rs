//! Rule-based risk assessment of an open, collateralized loan.

use tracing::debug;

use crate::RiskError;

/// Credit score assumed when the borrower has no score.
pub const UNKNOWN_CREDIT_SCORE: f64 = 300.0;
/// Volatility used for chains missing from the table.
const DEFAULT_VOLATILITY: f64 = 0.30;
/// Collateral ratio, in percent, at which a position is liquidated.
const LIQUIDATION_THRESHOLD: f64 = 120.0;
/// Weights of credit, collateral, volatility and repayment risk.
const DEFAULT_WEIGHTS: [f64; 4] = [0.40, 0.30, 0.15, 0.15];

/// Annualized price volatility of a chain's native collateral, as a fraction.
#[must_use]
pub fn chain_volatility(chain: &str) -> f64 {
    match chain.to_ascii_lowercase().as_str() {
        "ethereum" => 0.25,
        "polygon" => 0.30,
        "bsc" => 0.28,
        "aptos" => 0.35,
        "flow" => 0.32,
        _ => DEFAULT_VOLATILITY,
    }
}

/// Share of loans repaid on or before their due date, in percent.
///
/// A borrower with no loans gets 50. `repaid_on_time` is capped at `total`.
#[must_use]
pub fn repayment_performance(repaid_on_time: usize, total: usize) -> f64 {
    if total == 0 {
        return 50.0;
    }
    repaid_on_time.min(total) as f64 / total as f64 * 100.0
}

/// An open loan as stored by the lending desk.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoanPosition {
    pub loan_amount: f64,
    pub collateral_amount: f64,
    pub chain: String,
    /// Borrower's credit score; [`UNKNOWN_CREDIT_SCORE`] when absent.
    #[serde(default)]
    pub credit_score: Option<f64>,
    #[serde(default)]
    pub loans_repaid_on_time: usize,
    #[serde(default)]
    pub total_loans: usize,
}

impl LoanPosition {
    /// Derive the four assessment factors.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RiskError::NonFiniteField`] | an amount or the credit score is NaN or infinite |
    /// | [`RiskError::OutOfRange`] | `loan_amount <= 0` |
    pub fn factors(&self) -> Result<RiskFactors, RiskError> {
        let credit_score = self.credit_score.unwrap_or(UNKNOWN_CREDIT_SCORE);
        for (field, value) in [
            ("loan_amount", self.loan_amount),
            ("collateral_amount", self.collateral_amount),
            ("credit_score", credit_score),
        ] {
            if !value.is_finite() {
                return Err(RiskError::NonFiniteField { field });
            }
        }
        if self.loan_amount <= 0.0 {
            return Err(RiskError::OutOfRange {
                field: "loan_amount",
                value: self.loan_amount,
            });
        }

        Ok(RiskFactors {
            credit_score,
            collateral_ratio: self.collateral_amount / self.loan_amount * 100.0,
            market_volatility: chain_volatility(&self.chain),
            historical_performance: repayment_performance(
                self.loans_repaid_on_time,
                self.total_loans,
            ),
        })
    }
}

/// Inputs of [`assess_loan`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RiskFactors {
    /// Credit score on the 300–850 scale.
    pub credit_score: f64,
    /// Collateral value over loan value, in percent.
    pub collateral_ratio: f64,
    /// Collateral price volatility as a fraction, strictly positive.
    pub market_volatility: f64,
    /// On-time repayment share in `[0, 100]`.
    pub historical_performance: f64,
}

/// Band of the mean of default probability and liquidation risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Bands at 30, 50 and 70.
    #[must_use]
    pub fn from_average(average: f64) -> Self {
        match average {
            a if a >= 70.0 => RiskLevel::Critical,
            a if a >= 50.0 => RiskLevel::High,
            a if a >= 30.0 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

/// Outcome of [`assess_loan`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LoanRiskAssessment {
    pub risk_level: RiskLevel,
    /// Weighted factor risk in `[0, 100]`.
    pub default_probability: f64,
    /// One of 10, 25, 50 or 80.
    pub liquidation_risk: f64,
    /// `clamp(collateral_ratio / 2 - liquidation_risk, 0, 100)`.
    pub collateral_health: f64,
    pub factors: RiskFactors,
    pub recommendations: Vec<String>,
}

/// Assess an open loan from its factors.
///
/// Default probability blends four risks with weights 0.40, 0.30, 0.15 and
/// 0.15: `max(0, 100 - credit_score / 10)`, `max(0, 100 - collateral_ratio)`,
/// `100 * market_volatility` and `100 - historical_performance`. Liquidation
/// risk bands the collateral buffer over the 120% threshold measured in
/// volatility points: below 1 is 80, below 2 is 50, below 3 is 25, else 10.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`RiskError::NonFiniteField`] | any factor is NaN or infinite |
/// | [`RiskError::OutOfRange`] | `market_volatility <= 0` |
pub fn assess_loan(factors: &RiskFactors) -> Result<LoanRiskAssessment, RiskError> {
    // --- Validate inputs ---
    let fields = [
        ("credit_score", factors.credit_score),
        ("collateral_ratio", factors.collateral_ratio),
        ("market_volatility", factors.market_volatility),
        ("historical_performance", factors.historical_performance),
    ];
    if let Some(&(field, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
        return Err(RiskError::NonFiniteField { field });
    }
    if factors.market_volatility <= 0.0 {
        return Err(RiskError::OutOfRange {
            field: "market_volatility",
            value: factors.market_volatility,
        });
    }

    let default_probability = default_probability(factors);
    let liquidation_risk = liquidation_risk(factors.collateral_ratio, factors.market_volatility);
    let collateral_health = (factors.collateral_ratio / 2.0 - liquidation_risk).clamp(0.0, 100.0);
    let risk_level = RiskLevel::from_average((default_probability + liquidation_risk) / 2.0);

    debug!(default_probability, liquidation_risk, ?risk_level, "loan assessed");
    Ok(LoanRiskAssessment {
        risk_level,
        default_probability,
        liquidation_risk,
        collateral_health,
        factors: *factors,
        recommendations: recommendations(risk_level, default_probability),
    })
}

fn default_probability(factors: &RiskFactors) -> f64 {
    let risks = [
        (100.0 - factors.credit_score / 10.0).max(0.0),
        (100.0 - factors.collateral_ratio).max(0.0),
        factors.market_volatility * 100.0,
        100.0 - factors.historical_performance,
    ];
    risks
        .iter()
        .zip(DEFAULT_WEIGHTS)
        .map(|(r, w)| r * w)
        .sum::<f64>()
        .clamp(0.0, 100.0)
}

fn liquidation_risk(collateral_ratio: f64, volatility: f64) -> f64 {
    let buffer = (collateral_ratio - LIQUIDATION_THRESHOLD) / (volatility * 100.0);
    match buffer {
        b if b < 1.0 => 80.0,
        b if b < 2.0 => 50.0,
        b if b < 3.0 => 25.0,
        _ => 10.0,
    }
}

fn recommendations(level: RiskLevel, default_probability: f64) -> Vec<String> {
    let elevated = matches!(level, RiskLevel::High | RiskLevel::Critical);
    let rules = [
        (elevated, "Consider adding more collateral to reduce risk"),
        (elevated, "Monitor market conditions closely"),
        (
            default_probability > 50.0,
            "Review repayment schedule and consider early repayment",
        ),
        (
            level == RiskLevel::Medium,
            "Maintain healthy collateral ratio above 150%",
        ),
    ];
    rules
        .iter()
        .filter(|(applies, _)| *applies)
        .map(|(_, text)| (*text).to_string())
        .collect()
}
