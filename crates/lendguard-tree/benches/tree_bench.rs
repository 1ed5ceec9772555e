//! Criterion benchmarks for lendguard-tree: regression and isolation tree building.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use lendguard_tree::{DecisionTree, FeatureVector, IsolationTree};

fn make_regression(n_samples: usize, n_features: usize, seed: u64) -> (Vec<FeatureVector>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut targets = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let row: Vec<f64> = (0..n_features).map(|_| rng.r#gen::<f64>() * 100.0).collect();
        targets.push(0.6 * row[0] + 0.4 * row[1]);
        features.push(FeatureVector::new(row).unwrap());
    }
    (features, targets)
}

fn bench_decision_tree_build(c: &mut Criterion) {
    let (features, targets) = make_regression(500, 10, 42);
    c.bench_function("decision_tree_build_500x10", |b| {
        b.iter(|| DecisionTree::build(&features, &targets).unwrap());
    });
}

fn bench_isolation_tree_build(c: &mut Criterion) {
    let (features, _) = make_regression(256, 9, 42);
    c.bench_function("isolation_tree_build_256x9", |b| {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        b.iter(|| IsolationTree::build(&features, &mut rng).unwrap());
    });
}

criterion_group!(benches, bench_decision_tree_build, bench_isolation_tree_build);
criterion_main!(benches);
