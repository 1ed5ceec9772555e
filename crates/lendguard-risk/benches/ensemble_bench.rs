use criterion::{Criterion, criterion_group, criterion_main};
use lendguard_risk::{EnsembleInput, FeatureVector, RiskEnsemble};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn book(n: usize) -> (Vec<FeatureVector>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    (0..n)
        .map(|_| {
            let values: Vec<f64> = (0..10).map(|_| rng.gen_range(0.0..100.0)).collect();
            let target = 0.5 * values[1] + 0.5 * values[6];
            (FeatureVector::new(values).unwrap(), target)
        })
        .unzip()
}

fn bench_ensemble(c: &mut Criterion) {
    let (features, targets) = book(200);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut ensemble = RiskEnsemble::new(&mut rng).unwrap();

    c.bench_function("risk_ensemble_train_200", |b| {
        b.iter(|| {
            let mut fitted = ensemble.clone();
            fitted.train(&features, &targets, &mut rng).unwrap();
        })
    });

    ensemble.train(&features, &targets, &mut rng).unwrap();
    let input = EnsembleInput {
        payment_history: 80.0,
        loan_utilization: 30.0,
        account_age: 60.0,
        reputation_score: 70.0,
        wallet_stability: 60.0,
        transaction_frequency: 40.0,
        default_risk: 20.0,
        income_stability: 70.0,
        asset_value: None,
        collateral_ratio: None,
    };
    c.bench_function("risk_ensemble_predict", |b| {
        b.iter(|| ensemble.predict(&input).unwrap())
    });
}

criterion_group!(benches, bench_ensemble);
criterion_main!(benches);
