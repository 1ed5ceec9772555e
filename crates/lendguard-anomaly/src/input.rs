//! Raw transaction input and its normalized feature encoding.

use lendguard_tree::FeatureVector;

use crate::AnomalyError;

/// Number of features produced by [`AnomalyInput::normalize`].
pub const NORMALIZED_DIMENSIONS: usize = 9;

/// Raw fields describing one transaction and its account context.
///
/// Ages are in days, `time_of_day` in hours `[0, 24)`, `day_of_week` in `0..=6`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnomalyInput {
    pub transaction_amount: f64,
    pub transaction_frequency: f64,
    pub historical_average: f64,
    pub historical_std_dev: f64,
    pub account_age: f64,
    pub user_reputation: f64,
    pub wallet_age: f64,
    #[serde(default)]
    pub device_fingerprint: Option<String>,
    #[serde(default)]
    pub ip_country: Option<String>,
    #[serde(default)]
    pub previous_ip_country: Option<String>,
    pub time_of_day: f64,
    pub day_of_week: f64,
}

impl AnomalyInput {
    /// Check that every numeric field is finite.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError::NonFiniteField`] naming the first bad field.
    pub fn validate(&self) -> Result<(), AnomalyError> {
        let fields = [
            ("transaction_amount", self.transaction_amount),
            ("transaction_frequency", self.transaction_frequency),
            ("historical_average", self.historical_average),
            ("historical_std_dev", self.historical_std_dev),
            ("account_age", self.account_age),
            ("user_reputation", self.user_reputation),
            ("wallet_age", self.wallet_age),
            ("time_of_day", self.time_of_day),
            ("day_of_week", self.day_of_week),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite()) {
            Some(&(field, _)) => Err(AnomalyError::NonFiniteField { field }),
            None => Ok(()),
        }
    }

    /// Encode the raw fields as a 9-dimensional vector on a rough `[0, 100]` scale.
    ///
    /// | Index | Field | Encoding |
    /// |---|---|---|
    /// | 0 | amount | `min(100, amount / 10000 * 100)` |
    /// | 1 | frequency | `min(100, frequency)` |
    /// | 2 | historical average | `min(100, avg / 10000 * 100)` |
    /// | 3 | historical stddev | `min(100, std / 5000 * 100)` |
    /// | 4 | account age | `min(100, days / 3650 * 100)` |
    /// | 5 | reputation | `min(100, reputation)` |
    /// | 6 | wallet age | `min(100, days / 3650 * 100)` |
    /// | 7 | time of day | `hour * 4.166` |
    /// | 8 | day of week | `day * 14.286` |
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError::NonFiniteField`] when a field is not finite.
    pub fn normalize(&self) -> Result<FeatureVector, AnomalyError> {
        self.validate()?;
        let values = vec![
            (self.transaction_amount / 10_000.0 * 100.0).min(100.0),
            self.transaction_frequency.min(100.0),
            (self.historical_average / 10_000.0 * 100.0).min(100.0),
            (self.historical_std_dev / 5_000.0 * 100.0).min(100.0),
            (self.account_age / 3_650.0 * 100.0).min(100.0),
            self.user_reputation.min(100.0),
            (self.wallet_age / 3_650.0 * 100.0).min(100.0),
            self.time_of_day * 4.166,
            self.day_of_week * 14.286,
        ];
        Ok(FeatureVector::new(values)?)
    }

    /// Both countries are known and differ.
    #[must_use]
    pub fn country_changed(&self) -> bool {
        match (&self.ip_country, &self.previous_ip_country) {
            (Some(current), Some(previous)) => {
                !current.is_empty() && !previous.is_empty() && current != previous
            }
            _ => false,
        }
    }

    /// Transaction happened between 23:00 and 03:00.
    #[must_use]
    pub fn off_hours(&self) -> bool {
        self.time_of_day < 3.0 || self.time_of_day > 23.0
    }

    /// Frequency exceeds three times the historical average.
    #[must_use]
    pub fn frequency_spike(&self) -> bool {
        self.transaction_frequency > self.historical_average * 3.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn typical_input() -> AnomalyInput {
        AnomalyInput {
            transaction_amount: 1_000.0,
            transaction_frequency: 5.0,
            historical_average: 900.0,
            historical_std_dev: 200.0,
            account_age: 400.0,
            user_reputation: 80.0,
            wallet_age: 500.0,
            device_fingerprint: None,
            ip_country: Some("DE".into()),
            previous_ip_country: Some("DE".into()),
            time_of_day: 14.0,
            day_of_week: 2.0,
        }
    }

    #[test]
    fn normalize_applies_fixed_divisors() {
        let v = typical_input().normalize().unwrap();
        assert_eq!(v.len(), NORMALIZED_DIMENSIONS);
        assert!((v[0] - 10.0).abs() < 1e-12);
        assert!((v[1] - 5.0).abs() < 1e-12);
        assert!((v[2] - 9.0).abs() < 1e-12);
        assert!((v[3] - 4.0).abs() < 1e-12);
        assert!((v[7] - 14.0 * 4.166).abs() < 1e-12);
        assert!((v[8] - 2.0 * 14.286).abs() < 1e-12);
    }

    #[test]
    fn normalize_caps_at_one_hundred() {
        let mut input = typical_input();
        input.transaction_amount = 1e9;
        input.account_age = 1e6;
        let v = input.normalize().unwrap();
        assert_eq!(v[0], 100.0);
        assert_eq!(v[4], 100.0);
    }

    #[test]
    fn non_finite_field_is_named() {
        let mut input = typical_input();
        input.wallet_age = f64::NAN;
        let err = input.normalize().unwrap_err();
        assert!(matches!(err, AnomalyError::NonFiniteField { field: "wallet_age" }));
    }

    #[test]
    fn country_change_requires_both_sides() {
        let mut input = typical_input();
        assert!(!input.country_changed());
        input.ip_country = Some("FR".into());
        assert!(input.country_changed());
        input.previous_ip_country = None;
        assert!(!input.country_changed());
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let json = r#"{
            "transaction_amount": 10.0, "transaction_frequency": 1.0,
            "historical_average": 10.0, "historical_std_dev": 0.0,
            "account_age": 100.0, "user_reputation": 50.0, "wallet_age": 100.0,
            "time_of_day": 12.0, "day_of_week": 3.0
        }"#;
        let input: AnomalyInput = serde_json::from_str(json).unwrap();
        assert!(input.ip_country.is_none());
    }
}
