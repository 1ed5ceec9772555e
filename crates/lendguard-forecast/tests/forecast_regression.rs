use lendguard_forecast::{
    HoltSmoothing, LoanAction, LoanDefaultFactors, Trend, forecast_time_series,
    predict_loan_default,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[test]
fn holt_on_constant_series_is_flat() {
    let out = HoltSmoothing::new().forecast(&[10.0, 10.0, 10.0, 10.0], 5).unwrap();
    assert!(out.iter().all(|&v| v == 10.0));
}

#[test]
fn seeded_forecasts_are_reproducible() {
    let history: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.7).sin() * 5.0 + i as f64).collect();
    let a = forecast_time_series(&history, 12, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
    let b = forecast_time_series(&history, 12, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
    assert_eq!(a.point_forecast, b.point_forecast);
    assert_eq!(a.trend, Trend::Increasing);
    assert!(a.change_rate > 5.0);

    let json = serde_json::to_value(&a).unwrap();
    assert_eq!(json["trend"], "INCREASING");
    assert_eq!(json["point_forecast"].as_array().unwrap().len(), 12);
}

#[test]
fn worst_case_borrower_alerts_lender() {
    let pred = predict_loan_default(&LoanDefaultFactors {
        payment_history: 30.0,
        delinquency_count: 3,
        utilization_ratio: 0.9,
        income_stability: 30.0,
        account_age_months: 6.0,
    })
    .unwrap();
    assert_eq!(pred.default_probability, 100.0);
    assert_eq!(pred.risk_factors.len(), 5);
    assert_eq!(pred.recommended_action, LoanAction::AlertLender);
    let json = serde_json::to_value(&pred).unwrap();
    assert_eq!(json["recommended_action"], "ALERT_LENDER");
}
