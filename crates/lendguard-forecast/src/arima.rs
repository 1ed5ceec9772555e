//! First-difference autoregressive forecaster with a noise term.

use rand::Rng;

use crate::{ForecastError, error::check_finite};

/// Point forecasts with a per-step confidence in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct ArimaForecast {
    pub values: Vec<f64>,
    pub confidence: Vec<f64>,
}

/// A simplified ARIMA(1,1,1)-style forecaster.
///
/// The series is differenced once. Two AR coefficients are estimated as
/// `(d_last - d_0) / len(d)` and `(d_last - d_{len-2}) / 2`; each step adds
/// `Σ ar_j · d_{len-1-j}` plus MA noise `Σ ma_j · (u - 0.5)` to the running
/// value. Confidence starts at 95 and drops by 5 per step, floored at 50.
///
/// # Defaults
///
/// | Parameter    | Default       |
/// |--------------|---------------|
/// | `ma_weights` | `[0.1, 0.05]` |
#[derive(Debug, Clone)]
pub struct ArimaForecaster {
    ma_weights: [f64; 2],
}

impl ArimaForecaster {
    /// Create a forecaster with the default MA weights.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ma_weights: [0.1, 0.05],
        }
    }

    /// Set the two MA noise weights.
    #[must_use]
    pub fn with_ma_weights(mut self, ma_weights: [f64; 2]) -> Self {
        self.ma_weights = ma_weights;
        self
    }

    /// Forecast `steps` values past the end of `data`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForecastError::InsufficientHistory`] | fewer than 2 observations |
    /// | [`ForecastError::NonFiniteValue`] | an observation is NaN or infinite |
    pub fn forecast<R: Rng + ?Sized>(
        &self,
        data: &[f64],
        steps: usize,
        rng: &mut R,
    ) -> Result<ArimaForecast, ForecastError> {
        if data.len() < 2 {
            return Err(ForecastError::InsufficientHistory {
                required: 2,
                got: data.len(),
            });
        }
        check_finite(data)?;

        let diffs: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();
        let last = diffs.len() - 1;
        let ar = [
            (diffs[last] - diffs[0]) / diffs.len() as f64,
            (diffs[last] - diffs[last.saturating_sub(1)]) / 2.0,
        ];
        // Only as many AR lags as there are differences.
        let ar_part: f64 = ar
            .iter()
            .zip(diffs.iter().rev())
            .map(|(coef, d)| coef * d)
            .sum();

        let mut value = data[data.len() - 1];
        let mut values = Vec::with_capacity(steps);
        let mut confidence = Vec::with_capacity(steps);
        for i in 0..steps {
            let ma_part: f64 = self
                .ma_weights
                .iter()
                .map(|w| w * (rng.r#gen::<f64>() - 0.5))
                .sum();
            value += ar_part + ma_part;
            values.push(value);
            confidence.push((95.0 - 5.0 * i as f64).max(50.0));
        }
        Ok(ArimaForecast { values, confidence })
    }
}

impl Default for ArimaForecaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn linear_series_without_noise_extends_by_ar_term() {
        let arima = ArimaForecaster::new().with_ma_weights([0.0, 0.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        // constant differences: both AR coefficients are 0
        let out = arima.forecast(&[1.0, 2.0, 3.0, 4.0], 3, &mut rng).unwrap();
        assert_eq!(out.values, vec![4.0, 4.0, 4.0]);
        assert_eq!(out.confidence, vec![95.0, 90.0, 85.0]);
    }

    #[test]
    fn accelerating_series_uses_both_lags() {
        let arima = ArimaForecaster::new().with_ma_weights([0.0, 0.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        // diffs [1, 2, 4]; ar = [1, 1]; step = 4 + 2
        let out = arima.forecast(&[0.0, 1.0, 3.0, 7.0], 2, &mut rng).unwrap();
        assert_eq!(out.values, vec![13.0, 19.0]);
    }

    #[test]
    fn two_points_use_single_lag() {
        let arima = ArimaForecaster::new().with_ma_weights([0.0, 0.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let out = arima.forecast(&[5.0, 7.0], 1, &mut rng).unwrap();
        // one difference: ar[0] = 0
        assert_eq!(out.values, vec![7.0]);
    }

    #[test]
    fn confidence_floors_at_fifty() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let out = ArimaForecaster::new()
            .forecast(&[1.0, 2.0], 15, &mut rng)
            .unwrap();
        assert_eq!(out.confidence[14], 50.0);
        assert!(out.confidence.iter().all(|&c| c >= 50.0));
    }

    #[test]
    fn noise_is_seeded() {
        let arima = ArimaForecaster::new();
        let data = [3.0, 5.0, 4.0, 6.0];
        let a = arima.forecast(&data, 5, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        let b = arima.forecast(&data, 5, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_short_series() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            ArimaForecaster::new().forecast(&[1.0], 3, &mut rng),
            Err(ForecastError::InsufficientHistory { required: 2, got: 1 })
        ));
    }
}
