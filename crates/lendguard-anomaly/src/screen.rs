//! Rule-based fraud screen for a single transfer.

use std::collections::HashSet;

use tracing::debug;

use crate::AnomalyError;

const MIN_USUAL_AMOUNT: f64 = 10.0;
const MAX_USUAL_AMOUNT: f64 = 100_000.0;
const NEW_ACCOUNT_DAYS: f64 = 7.0;
const MAX_REPEATED_TRANSACTIONS: u32 = 10;
const SUSPICIOUS_SCORE: u32 = 50;

/// One transfer as seen by the screen.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScreenInput {
    pub amount: f64,
    /// Age of the sending account in days.
    pub account_age_days: f64,
    pub from_wallet: String,
    pub to_wallet: String,
    /// Transfers made by the sender in the current session.
    #[serde(default)]
    pub transaction_count: u32,
}

/// Outcome band of a screen score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreenRecommendation {
    /// Score below 40.
    Approve,
    /// Score in `[40, 70)`.
    Review,
    /// Score of 70 or more.
    Reject,
}

impl ScreenRecommendation {
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 70 => ScreenRecommendation::Reject,
            s if s >= 40 => ScreenRecommendation::Review,
            _ => ScreenRecommendation::Approve,
        }
    }
}

/// Verdict of [`TransactionScreen::analyze`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FraudAnalysis {
    /// `risk_score >= 50`.
    pub is_suspicious: bool,
    pub risk_score: u32,
    /// One line per rule that fired, in rule order.
    pub flags: Vec<String>,
    pub recommendation: ScreenRecommendation,
}

/// Additive rule screen over a transfer.
///
/// | Rule | Points |
/// |---|---|
/// | amount > 100000 or < 10 | 25 |
/// | account younger than 7 days | 20 |
/// | sender equals receiver, or more than 10 transfers | 35 |
/// | sender on the blacklist | 50 |
///
/// Wallet comparison and blacklist lookup ignore ASCII case.
#[derive(Debug, Clone, Default)]
pub struct TransactionScreen {
    blacklist: HashSet<String>,
}

impl TransactionScreen {
    /// Create a screen with an empty blacklist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the blacklist. Blank entries are ignored.
    #[must_use]
    pub fn with_blacklist<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blacklist = addresses
            .into_iter()
            .map(|a| a.as_ref().trim().to_ascii_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        self
    }

    // --- Getters ---

    #[must_use]
    pub fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }

    #[must_use]
    pub fn is_blacklisted(&self, address: &str) -> bool {
        self.blacklist.contains(&address.trim().to_ascii_lowercase())
    }

    /// Score one transfer.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError::NonFiniteField`] when `amount` or
    /// `account_age_days` is NaN or infinite.
    pub fn analyze(&self, input: &ScreenInput) -> Result<FraudAnalysis, AnomalyError> {
        if !input.amount.is_finite() {
            return Err(AnomalyError::NonFiniteField { field: "amount" });
        }
        if !input.account_age_days.is_finite() {
            return Err(AnomalyError::NonFiniteField {
                field: "account_age_days",
            });
        }

        let same_wallet = input
            .from_wallet
            .trim()
            .eq_ignore_ascii_case(input.to_wallet.trim());
        let rules = [
            (
                input.amount > MAX_USUAL_AMOUNT || input.amount < MIN_USUAL_AMOUNT,
                25,
                "Unusual transaction amount",
            ),
            (
                input.account_age_days < NEW_ACCOUNT_DAYS,
                20,
                "New account with high-value transaction",
            ),
            (
                same_wallet || input.transaction_count > MAX_REPEATED_TRANSACTIONS,
                35,
                "Suspicious transaction pattern detected",
            ),
            (
                self.is_blacklisted(&input.from_wallet),
                50,
                "Wallet address flagged in security database",
            ),
        ];

        let mut risk_score = 0;
        let mut flags = Vec::new();
        for (fired, points, flag) in rules {
            if fired {
                risk_score += points;
                flags.push(flag.to_string());
            }
        }

        debug!(risk_score, n_flags = flags.len(), "transfer screened");
        Ok(FraudAnalysis {
            is_suspicious: risk_score >= SUSPICIOUS_SCORE,
            risk_score,
            flags,
            recommendation: ScreenRecommendation::from_score(risk_score),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer() -> ScreenInput {
        ScreenInput {
            amount: 500.0,
            account_age_days: 120.0,
            from_wallet: "0xAbC1".into(),
            to_wallet: "0xdef2".into(),
            transaction_count: 2,
        }
    }

    #[test]
    fn ordinary_transfer_is_approved() {
        let out = TransactionScreen::new().analyze(&transfer()).unwrap();
        assert_eq!(out.risk_score, 0);
        assert!(out.flags.is_empty());
        assert!(!out.is_suspicious);
        assert_eq!(out.recommendation, ScreenRecommendation::Approve);
    }

    #[test]
    fn amount_bounds_are_exclusive() {
        let screen = TransactionScreen::new();
        for (amount, expected) in [(9.99, 25), (10.0, 0), (100_000.0, 0), (100_000.01, 25)] {
            let mut input = transfer();
            input.amount = amount;
            assert_eq!(screen.analyze(&input).unwrap().risk_score, expected, "{amount}");
        }
    }

    #[test]
    fn self_transfer_and_repetition_fire_once() {
        let mut input = transfer();
        input.to_wallet = "0xabc1".into();
        input.transaction_count = 11;
        let out = TransactionScreen::new().analyze(&input).unwrap();
        assert_eq!(out.risk_score, 35);
        assert_eq!(out.flags, vec!["Suspicious transaction pattern detected"]);
        assert_eq!(out.recommendation, ScreenRecommendation::Approve);
    }

    #[test]
    fn review_band_is_not_yet_suspicious() {
        // 25 + 20 = 45
        let mut input = transfer();
        input.amount = 5.0;
        input.account_age_days = 2.0;
        let out = TransactionScreen::new().analyze(&input).unwrap();
        assert_eq!(out.risk_score, 45);
        assert!(!out.is_suspicious);
        assert_eq!(out.recommendation, ScreenRecommendation::Review);
    }

    #[test]
    fn blacklisted_sender_is_suspicious() {
        let screen = TransactionScreen::new().with_blacklist(["  0xABC1 ", ""]);
        assert_eq!(screen.blacklist_len(), 1);
        let out = screen.analyze(&transfer()).unwrap();
        assert_eq!(out.risk_score, 50);
        assert!(out.is_suspicious);
        assert_eq!(out.recommendation, ScreenRecommendation::Review);
    }

    #[test]
    fn every_rule_rejects() {
        let mut input = transfer();
        input.amount = 250_000.0;
        input.account_age_days = 1.0;
        input.transaction_count = 40;
        let screen = TransactionScreen::new().with_blacklist(["0xabc1"]);
        let out = screen.analyze(&input).unwrap();
        assert_eq!(out.risk_score, 130);
        assert_eq!(out.flags.len(), 4);
        assert_eq!(out.flags[0], "Unusual transaction amount");
        assert_eq!(out.recommendation, ScreenRecommendation::Reject);
    }

    #[test]
    fn recommendation_bands() {
        assert_eq!(ScreenRecommendation::from_score(39), ScreenRecommendation::Approve);
        assert_eq!(ScreenRecommendation::from_score(40), ScreenRecommendation::Review);
        assert_eq!(ScreenRecommendation::from_score(69), ScreenRecommendation::Review);
        assert_eq!(ScreenRecommendation::from_score(70), ScreenRecommendation::Reject);
    }

    #[test]
    fn non_finite_amount_rejected() {
        let mut input = transfer();
        input.amount = f64::NAN;
        assert!(matches!(
            TransactionScreen::new().analyze(&input),
            Err(AnomalyError::NonFiniteField { field: "amount" })
        ));
    }
}
