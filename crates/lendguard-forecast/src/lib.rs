//! Forecasting for the lendguard engine.
//!
//! Time-series forecasts blend a differenced autoregressive model with Holt
//! smoothing. Loan default and churn predictions are additive rule scores.

mod analytics;
mod arima;
mod boosted;
mod error;
mod forecast;
mod smoothing;

pub use analytics::{
    ChurnFactors, ChurnPrediction, ChurnRisk, LoanAction, LoanDefaultFactors,
    LoanDefaultPrediction, MarketDirection, MarketTrendForecast, forecast_market_trend,
    predict_churn, predict_loan_default,
};
pub use arima::{ArimaForecast, ArimaForecaster};
pub use boosted::{BoostedRegressor, BoostedRegressorConfig};
pub use error::ForecastError;
pub use forecast::{Forecast, Trend, classify_trend, forecast_time_series};
pub use smoothing::HoltSmoothing;
