//! Rule-based loan default and churn predictions, and market trend forecasts.

use rand::Rng;
use tracing::debug;

use crate::{ForecastError, HoltSmoothing, error::check_finite};

/// Borrower signals for default prediction.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoanDefaultFactors {
    /// Payment history score in `[0, 100]`.
    pub payment_history: f64,
    pub delinquency_count: u32,
    /// Outstanding over limit, in `[0, 1]`.
    pub utilization_ratio: f64,
    /// Income stability score in `[0, 100]`.
    pub income_stability: f64,
    pub account_age_months: f64,
}

/// Escalation for a borrower at risk of default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanAction {
    Monitor,
    Intervene,
    AlertLender,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoanDefaultPrediction {
    pub default_probability: f64,
    pub risk_factors: Vec<String>,
    /// Months until a likely default; only set above 60% risk.
    pub time_to_default: Option<f64>,
    pub recommended_action: LoanAction,
}

/// Score default risk by additive rules.
///
/// | Rule | Points |
/// |---|---|
/// | payment history < 50 | 25 |
/// | delinquencies > 2 | 30 |
/// | utilization > 0.8 | 15 |
/// | income stability < 40 | 20 |
/// | account age < 12 months | 10 |
///
/// # Errors
///
/// Returns [`ForecastError::NonFiniteField`] for NaN or infinite factors.
pub fn predict_loan_default(
    factors: &LoanDefaultFactors,
) -> Result<LoanDefaultPrediction, ForecastError> {
    check_fields(&[
        ("payment_history", factors.payment_history),
        ("utilization_ratio", factors.utilization_ratio),
        ("income_stability", factors.income_stability),
        ("account_age_months", factors.account_age_months),
    ])?;

    let rules = [
        (factors.payment_history < 50.0, 25.0, "Poor payment history"),
        (factors.delinquency_count > 2, 30.0, "Multiple delinquencies"),
        (factors.utilization_ratio > 0.8, 15.0, "High debt utilization"),
        (factors.income_stability < 40.0, 20.0, "Unstable income"),
        (factors.account_age_months < 12.0, 10.0, "New account"),
    ];
    let (risk, risk_factors) = apply_rules(&rules);
    let risk = risk.clamp(0.0, 100.0);

    let time_to_default = (risk > 60.0).then(|| ((100.0 - risk).round() / 2.0).clamp(1.0, 24.0));
    let recommended_action = if risk < 30.0 {
        LoanAction::Monitor
    } else if risk < 70.0 {
        LoanAction::Intervene
    } else {
        LoanAction::AlertLender
    };

    Ok(LoanDefaultPrediction {
        default_probability: risk,
        risk_factors,
        time_to_default,
        recommended_action,
    })
}

/// User engagement signals for churn prediction.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChurnFactors {
    pub account_age_months: f64,
    pub last_activity_days: f64,
    /// Transactions per month.
    pub transaction_frequency: f64,
    pub average_transaction_value: f64,
    pub support_tickets: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChurnRisk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChurnPrediction {
    pub churn_probability: f64,
    pub churn_risk: ChurnRisk,
    pub retention_factors: Vec<String>,
    pub recommended_retention_strategy: String,
}

/// Score churn risk by additive rules.
///
/// Inactivity over 90 days adds 35 (over 30 days adds 15), an account under
/// 6 months 20, fewer than 2 transactions 20 and more than 3 support tickets
/// 15. An average transaction value over 5000 subtracts 10, floored at 0.
///
/// # Errors
///
/// Returns [`ForecastError::NonFiniteField`] for NaN or infinite factors.
pub fn predict_churn(factors: &ChurnFactors) -> Result<ChurnPrediction, ForecastError> {
    check_fields(&[
        ("account_age_months", factors.account_age_months),
        ("last_activity_days", factors.last_activity_days),
        ("transaction_frequency", factors.transaction_frequency),
        ("average_transaction_value", factors.average_transaction_value),
    ])?;

    let rules = [
        (factors.last_activity_days > 90.0, 35.0, "No recent activity"),
        (
            factors.last_activity_days > 30.0 && factors.last_activity_days <= 90.0,
            15.0,
            "Reduced activity",
        ),
        (factors.account_age_months < 6.0, 20.0, "New user"),
        (factors.transaction_frequency < 2.0, 20.0, "Low engagement"),
        (factors.support_tickets > 3, 15.0, "Multiple support issues"),
    ];
    let (mut score, retention_factors) = apply_rules(&rules);
    if factors.average_transaction_value > 5000.0 {
        score = (score - 10.0).max(0.0);
    }
    let score = score.clamp(0.0, 100.0);

    let churn_risk = if score < 30.0 {
        ChurnRisk::Low
    } else if score < 60.0 {
        ChurnRisk::Medium
    } else {
        ChurnRisk::High
    };
    let strategy = match churn_risk {
        ChurnRisk::High if factors.last_activity_days > 90.0 => {
            "Re-engagement campaign via email/push"
        }
        ChurnRisk::High => "Proactive support outreach + special offer",
        ChurnRisk::Medium => "Increase engagement touchpoints",
        ChurnRisk::Low => "Standard monitoring",
    };

    Ok(ChurnPrediction {
        churn_probability: score,
        churn_risk,
        retention_factors,
        recommended_retention_strategy: strategy.to_string(),
    })
}

/// Market direction implied by a price forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketDirection {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MarketTrendForecast {
    pub price_forecast: Vec<f64>,
    pub volatility_forecast: Vec<f64>,
    pub trend: MarketDirection,
}

/// Holt forecast of prices plus a jittered volume-based volatility path.
///
/// Volatility is the last `horizon` volumes each scaled by a factor drawn
/// uniformly from `[0.8, 1.2)`. The market is bullish when the final
/// forecast exceeds the last observed price.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ForecastError::InvalidHorizon`] | `horizon` is 0 |
/// | [`ForecastError::EmptySeries`] | `prices` is empty |
/// | [`ForecastError::NonFiniteValue`] | a price or volume is NaN or infinite |
pub fn forecast_market_trend<R: Rng + ?Sized>(
    prices: &[f64],
    volumes: &[f64],
    horizon: usize,
    rng: &mut R,
) -> Result<MarketTrendForecast, ForecastError> {
    if horizon == 0 {
        return Err(ForecastError::InvalidHorizon);
    }
    let price_forecast = HoltSmoothing::new().forecast(prices, horizon)?;
    check_finite(volumes)?;

    let volatility_forecast = volumes[volumes.len().saturating_sub(horizon)..]
        .iter()
        .map(|v| v * rng.gen_range(0.8..1.2))
        .collect();

    let current = prices[prices.len() - 1];
    let trend = match price_forecast.last() {
        Some(&last) if last > current => MarketDirection::Bullish,
        _ => MarketDirection::Bearish,
    };
    debug!(?trend, "market trend forecast");

    Ok(MarketTrendForecast {
        price_forecast,
        volatility_forecast,
        trend,
    })
}

fn check_fields(fields: &[(&'static str, f64)]) -> Result<(), ForecastError> {
    match fields.iter().find(|(_, v)| !v.is_finite()) {
        Some(&(field, _)) => Err(ForecastError::NonFiniteField { field }),
        None => Ok(()),
    }
}

/// Sum the points of matching rules and collect their labels.
fn apply_rules(rules: &[(bool, f64, &str)]) -> (f64, Vec<String>) {
    rules
        .iter()
        .filter(|(applies, _, _)| *applies)
        .fold((0.0, Vec::new()), |(score, mut labels), (_, points, label)| {
            labels.push((*label).to_string());
            (score + points, labels)
        })
}
