//! End-to-end checks for the anomaly detector on a deterministic history.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use lendguard_anomaly::{
    AnomalyDetector, AnomalyInput, LocalOutlierFactor, LofMode, Severity, SuggestedAction,
};

fn base_input() -> AnomalyInput {
    AnomalyInput {
        transaction_amount: 1_200.0,
        transaction_frequency: 4.0,
        historical_average: 1_100.0,
        historical_std_dev: 300.0,
        account_age: 720.0,
        user_reputation: 85.0,
        wallet_age: 900.0,
        device_fingerprint: Some("fp-1".into()),
        ip_country: Some("NL".into()),
        previous_ip_country: Some("NL".into()),
        time_of_day: 13.0,
        day_of_week: 3.0,
    }
}

/// Detector trained on 300 transactions jittered around `base_input`.
fn trained_detector(lof: LocalOutlierFactor) -> AnomalyDetector {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let history = (0..300)
        .map(|_| {
            let mut jitter = |lo: f64, hi: f64| lo + rng.r#gen::<f64>() * (hi - lo);
            let input = AnomalyInput {
                transaction_amount: jitter(800.0, 1_600.0),
                transaction_frequency: jitter(2.0, 6.0),
                historical_average: jitter(900.0, 1_300.0),
                historical_std_dev: jitter(200.0, 400.0),
                account_age: jitter(500.0, 1_000.0),
                user_reputation: jitter(70.0, 98.0),
                wallet_age: jitter(600.0, 1_200.0),
                time_of_day: jitter(9.0, 17.0),
                day_of_week: jitter(1.0, 6.0).floor(),
                ..base_input()
            };
            input.normalize().unwrap()
        })
        .collect();
    let mut detector = AnomalyDetector::new().with_lof(lof);
    detector.train_on_history(history, &mut rng).unwrap();
    detector
}

/// A routine transaction from an established account stays in the NORMAL band.
#[test]
fn routine_transaction_is_allowed() {
    let score = trained_detector(LocalOutlierFactor::new())
        .detect(&base_input())
        .unwrap();
    assert_eq!(score.severity, Severity::Normal, "score {}", score.overall_score);
    assert_eq!(score.suggested_action, SuggestedAction::Allow);
    assert!(!score.is_anomaly);
}

/// With exact LOF enabled, a large late-night transfer from a brand new, low-reputation account abroad is blocked.
#[test]
fn fraud_pattern_is_blocked() {
    let mut input = base_input();
    input.transaction_amount = 50_000.0;
    input.transaction_frequency = 80.0;
    input.historical_average = 20.0;
    input.account_age = 2.0;
    input.user_reputation = 5.0;
    input.wallet_age = 1.0;
    input.ip_country = Some("KP".into());
    input.time_of_day = 1.0;
    let lof = LocalOutlierFactor::new().with_mode(LofMode::Exact);
    let score = trained_detector(lof).detect(&input).unwrap();
    assert_eq!(score.algorithms.local_outlier_factor, 100.0);
    assert_eq!(score.severity, Severity::Critical, "score {}", score.overall_score);
    assert_eq!(score.suggested_action, SuggestedAction::Block);
    assert!(score.is_anomaly);
    assert!(score.reasons.len() >= 5);
}

/// Zero historical deviation removes the z-score term entirely.
#[test]
fn zero_std_dev_disables_z_score() {
    let mut input = base_input();
    input.historical_std_dev = 0.0;
    input.transaction_amount = 9_000.0;
    let score = trained_detector(LocalOutlierFactor::new())
        .detect(&input)
        .unwrap();
    assert_eq!(score.algorithms.z_score, 0.0);
}
