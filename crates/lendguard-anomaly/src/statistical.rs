use crate::input::AnomalyInput;

/// Rule-based score from the raw transaction fields.
///
/// | Signal | Points |
/// |---|---|
/// | amount z-score (when stddev > 0) | `min(30, 12 z)` |
/// | frequency > 3 x historical average | 20 |
/// | account age < 30 days / < 90 days | 15 / 5 |
/// | IP country changed | 10 |
/// | hour < 3 or > 23 | 5 |
/// | reputation < 40 | 15 |
///
/// The total is capped at 100.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalDetector;

impl StatisticalDetector {
    #[must_use]
    pub fn detect(&self, input: &AnomalyInput) -> f64 {
        let mut score = 0.0;

        if input.historical_std_dev > 0.0 {
            let z = ((input.transaction_amount - input.historical_average)
                / input.historical_std_dev)
                .abs();
            score += (z * 12.0).min(30.0);
        }
        if input.frequency_spike() {
            score += 20.0;
        }
        if input.account_age < 30.0 {
            score += 15.0;
        } else if input.account_age < 90.0 {
            score += 5.0;
        }
        if input.country_changed() {
            score += 10.0;
        }
        if input.off_hours() {
            score += 5.0;
        }
        if input.user_reputation < 40.0 {
            score += 15.0;
        }

        f64::min(score, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::tests::typical_input;

    #[test]
    fn typical_input_scores_amount_only() {
        // z = 100 / 200 = 0.5 -> 6 points.
        let score = StatisticalDetector.detect(&typical_input());
        assert!((score - 6.0).abs() < 1e-12);
    }

    #[test]
    fn every_signal_fires_and_caps() {
        let mut input = typical_input();
        input.transaction_amount = 100_000.0;
        input.transaction_frequency = 1e5;
        input.account_age = 3.0;
        input.ip_country = Some("BR".into());
        input.time_of_day = 1.0;
        input.user_reputation = 10.0;
        // 30 + 20 + 15 + 10 + 5 + 15 = 95
        assert!((StatisticalDetector.detect(&input) - 95.0).abs() < 1e-12);
    }

    #[test]
    fn medium_account_age_adds_five() {
        let mut input = typical_input();
        input.historical_std_dev = 0.0;
        input.account_age = 60.0;
        assert!((StatisticalDetector.detect(&input) - 5.0).abs() < 1e-12);
    }
}
