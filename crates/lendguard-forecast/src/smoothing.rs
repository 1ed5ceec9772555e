//! Holt double exponential smoothing.

use crate::{ForecastError, error::check_finite};

/// Level-and-trend exponential smoothing.
///
/// The level starts at the first observation and the trend at the first
/// difference (0 for a single observation). Every observation, including
/// the first, updates both before forecasting `level + i * trend`.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `alpha`   | 0.3     |
/// | `beta`    | 0.1     |
#[derive(Debug, Clone, Copy)]
pub struct HoltSmoothing {
    alpha: f64,
    beta: f64,
}

impl HoltSmoothing {
    /// Create a smoother with the default factors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            alpha: 0.3,
            beta: 0.1,
        }
    }

    /// Set the level smoothing factor.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidSmoothingFactor`] unless `alpha` is in `(0, 1]`.
    pub fn with_alpha(mut self, alpha: f64) -> Result<Self, ForecastError> {
        self.alpha = check_factor("alpha", alpha)?;
        Ok(self)
    }

    /// Set the trend smoothing factor.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::InvalidSmoothingFactor`] unless `beta` is in `(0, 1]`.
    pub fn with_beta(mut self, beta: f64) -> Result<Self, ForecastError> {
        self.beta = check_factor("beta", beta)?;
        Ok(self)
    }

    /// Forecast `steps` values past the end of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::EmptySeries`] for an empty series and
    /// [`ForecastError::NonFiniteValue`] for NaN or infinite observations.
    pub fn forecast(&self, data: &[f64], steps: usize) -> Result<Vec<f64>, ForecastError> {
        let (&first, rest) = data.split_first().ok_or(ForecastError::EmptySeries)?;
        check_finite(data)?;

        let mut level = first;
        let mut trend = rest.first().map_or(0.0, |&second| second - first);
        for &value in data {
            let last_level = level;
            level = self.alpha * value + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (level - last_level) + (1.0 - self.beta) * trend;
        }
        Ok((1..=steps).map(|i| level + i as f64 * trend).collect())
    }
}

impl Default for HoltSmoothing {
    fn default() -> Self {
        Self::new()
    }
}

fn check_factor(name: &'static str, value: f64) -> Result<f64, ForecastError> {
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(ForecastError::InvalidSmoothingFactor { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_series_forecasts_flat() {
        let out = HoltSmoothing::new().forecast(&[10.0; 4], 3).unwrap();
        assert_eq!(out, vec![10.0, 10.0, 10.0]);
    }

    #[test]
    fn single_point_has_no_trend() {
        let out = HoltSmoothing::new().forecast(&[7.0], 2).unwrap();
        assert_eq!(out, vec![7.0, 7.0]);
    }

    #[test]
    fn rising_series_keeps_rising() {
        let data: Vec<f64> = (0..20).map(|i| i as f64 * 2.0).collect();
        let out = HoltSmoothing::new().forecast(&data, 5).unwrap();
        assert!(out.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn factors_are_validated() {
        assert!(HoltSmoothing::new().with_alpha(0.0).is_err());
        assert!(HoltSmoothing::new().with_beta(1.5).is_err());
        assert!(HoltSmoothing::new().with_alpha(f64::NAN).is_err());
        assert!(HoltSmoothing::new().with_alpha(1.0).is_ok());
    }

    #[test]
    fn empty_series_rejected() {
        assert!(matches!(
            HoltSmoothing::new().forecast(&[], 3),
            Err(ForecastError::EmptySeries)
        ));
    }
}
