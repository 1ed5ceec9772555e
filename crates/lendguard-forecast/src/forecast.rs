//! ARIMA and Holt ensemble forecast.

use rand::Rng;
use tracing::{debug, instrument};

use crate::{ArimaForecaster, ForecastError, HoltSmoothing};

/// Recent-window length for trend classification.
const RECENT_WINDOW: usize = 10;
/// Percent change beyond which a series counts as moving.
const TREND_THRESHOLD: f64 = 5.0;
/// Two-sided 95% normal quantile.
const BOUND_Z: f64 = 1.96;

/// Direction of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// An ensemble forecast with bounds.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Forecast {
    pub point_forecast: Vec<f64>,
    pub upper_bound: Vec<f64>,
    pub lower_bound: Vec<f64>,
    /// Mean ARIMA step confidence, rounded.
    pub confidence: f64,
    pub trend: Trend,
    /// Percent change of the recent mean over the older mean, to one decimal.
    pub change_rate: f64,
    pub model: String,
}

/// Forecast `horizon` steps as the mean of ARIMA and Holt forecasts.
///
/// Bounds are `± 1.96 σ` of the history with the lower bound floored at 0.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ForecastError::InvalidHorizon`] | `horizon` is 0 |
/// | [`ForecastError::InsufficientHistory`] | fewer than 2 observations |
/// | [`ForecastError::NonFiniteValue`] | an observation is NaN or infinite |
#[instrument(skip_all, fields(n_points = history.len(), horizon = horizon))]
pub fn forecast_time_series<R: Rng + ?Sized>(
    history: &[f64],
    horizon: usize,
    rng: &mut R,
) -> Result<Forecast, ForecastError> {
    if horizon == 0 {
        return Err(ForecastError::InvalidHorizon);
    }
    let arima = ArimaForecaster::new().forecast(history, horizon, rng)?;
    let holt = HoltSmoothing::new().forecast(history, horizon)?;

    let point_forecast: Vec<f64> = arima
        .values
        .iter()
        .zip(&holt)
        .map(|(a, h)| (a + h) / 2.0)
        .collect();

    let margin = BOUND_Z * std_dev(history);
    let upper_bound = point_forecast.iter().map(|v| v + margin).collect();
    let lower_bound = point_forecast.iter().map(|v| (v - margin).max(0.0)).collect();

    let confidence =
        (arima.confidence.iter().sum::<f64>() / arima.confidence.len() as f64).round();
    let (trend, change_rate) = classify_trend(history);

    debug!(?trend, change_rate, confidence, "time series forecast");
    Ok(Forecast {
        point_forecast,
        upper_bound,
        lower_bound,
        confidence,
        trend,
        change_rate: (change_rate * 10.0).round() / 10.0,
        model: "arima-holt ensemble".to_string(),
    })
}

/// Compare the last 10 points with the rest.
///
/// The older window is the first `max(1, n - 10)` points, so short series
/// compare against their first point. A non-positive older mean gives a
/// change rate of 0.
#[must_use]
pub fn classify_trend(history: &[f64]) -> (Trend, f64) {
    if history.is_empty() {
        return (Trend::Stable, 0.0);
    }
    let recent = &history[history.len().saturating_sub(RECENT_WINDOW)..];
    let older = &history[..history.len().saturating_sub(RECENT_WINDOW).max(1)];
    let recent_mean = mean(recent);
    let older_mean = mean(older);

    let change_rate = if older_mean > 0.0 {
        (recent_mean - older_mean) / older_mean * 100.0
    } else {
        0.0
    };
    let trend = if change_rate > TREND_THRESHOLD {
        Trend::Increasing
    } else if change_rate < -TREND_THRESHOLD {
        Trend::Decreasing
    } else {
        Trend::Stable
    };
    (trend, change_rate)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0 for an empty slice.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn bounds_bracket_forecast() {
        let history: Vec<f64> = (0..30).map(|i| 100.0 + (i % 5) as f64).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let f = forecast_time_series(&history, 6, &mut rng).unwrap();
        assert_eq!(f.point_forecast.len(), 6);
        for ((p, u), l) in f.point_forecast.iter().zip(&f.upper_bound).zip(&f.lower_bound) {
            assert!(l <= p && p <= u);
            assert!(*l >= 0.0);
        }
        // mean of 95, 90, 85, 80, 75, 70
        assert_eq!(f.confidence, 83.0);
    }

    #[test]
    fn lower_bound_floors_at_zero() {
        let history = [0.0, 10.0, 0.0, 10.0, 0.0];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let f = forecast_time_series(&history, 3, &mut rng).unwrap();
        assert!(f.lower_bound.iter().all(|&l| l >= 0.0));
    }

    #[test]
    fn trend_classification() {
        let rising: Vec<f64> = (0..20).map(|i| if i < 10 { 100.0 } else { 120.0 }).collect();
        let (trend, rate) = classify_trend(&rising);
        assert_eq!(trend, Trend::Increasing);
        assert!((rate - 20.0).abs() < 1e-9);

        let falling: Vec<f64> = (0..20).map(|i| if i < 10 { 100.0 } else { 80.0 }).collect();
        assert_eq!(classify_trend(&falling).0, Trend::Decreasing);

        let flat = vec![50.0; 15];
        assert_eq!(classify_trend(&flat), (Trend::Stable, 0.0));
    }

    #[test]
    fn short_series_compares_with_first_point() {
        // recent = all 4 points (mean 25), older = first point (10)
        let (trend, rate) = classify_trend(&[10.0, 20.0, 30.0, 40.0]);
        assert_eq!(trend, Trend::Increasing);
        assert!((rate - 150.0).abs() < 1e-9);
    }

    #[test]
    fn non_positive_baseline_is_stable() {
        assert_eq!(classify_trend(&[0.0, 5.0, 10.0]), (Trend::Stable, 0.0));
    }

    #[test]
    fn zero_horizon_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = forecast_time_series(&[1.0, 2.0], 0, &mut rng).unwrap_err();
        assert_eq!(err.kind(), lendguard_tree::ErrorKind::Configuration);
    }
}
