//! End-to-end tests: CSV -> train -> JSON artifact / snapshot -> reload.

use std::fs;
use std::path::{Path, PathBuf};

use lendguard_io::{DatasetReader, ExperimentName, ResultWriter, SnapshotStore, TrainingReport};
use lendguard_risk::{FeatureVector, RiskEnsemble};
use lendguard_train::{ModelTrainingConfig, Trainer};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn training_round_trip() {
    let dataset = DatasetReader::new(&fixture_path("loan_book.csv"))
        .read_labelled()
        .expect("fixture should parse");
    assert_eq!(dataset.n_samples(), 40);
    assert_eq!(dataset.n_features(), 3);
    assert_eq!(dataset.target_name(), "default");

    let config = ModelTrainingConfig::new(20, 8)
        .unwrap()
        .with_learning_rate(0.001)
        .unwrap();
    let samples = dataset.to_samples();
    let mut trainer = Trainer::logistic(dataset.n_features());
    trainer.train_model(&samples, &config).unwrap();
    let cv = trainer.cross_validate(&samples, &config, 4).unwrap();

    let dir = TempDir::new().unwrap();
    let experiment = ExperimentName::new("loan_book".into()).unwrap();
    let writer = ResultWriter::new(dir.path(), experiment).unwrap();
    let report = TrainingReport {
        feature_names: dataset.feature_names(),
        config: &config,
        history: trainer.history(),
        summary: trainer.summary(),
        cross_validation: Some(&cv),
        tuning: None,
    };
    let path = writer.write_training(&report).unwrap();

    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(content["experiment"], "loan_book");
    assert_eq!(content["history"].as_array().unwrap().len(), 20);
    assert_eq!(content["cross_validation"]["folds"], 4);
    assert_eq!(
        content["cross_validation"]["fold_results"]
            .as_array()
            .unwrap()
            .len(),
        4
    );
    for metrics in content["history"].as_array().unwrap() {
        let accuracy = metrics["accuracy"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
    }
}

#[test]
fn series_fixture_reads_value_column() {
    let series = DatasetReader::new(&fixture_path("balances.csv"))
        .read_series("value")
        .unwrap();
    assert_eq!(series.len(), 24);
    assert!(series.iter().all(|v| v.is_finite()));
}

#[test]
fn risk_ensemble_snapshot_predicts_identically() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut features = Vec::new();
    let mut targets = Vec::new();
    for _ in 0..60 {
        let row: Vec<f64> = (0..10).map(|_| rng.gen_range(0.0..100.0)).collect();
        targets.push(0.5 * row[1] + 0.5 * row[6]);
        features.push(FeatureVector::new(row).unwrap());
    }
    let mut ensemble = RiskEnsemble::new(&mut rng)
        .unwrap()
        .with_forest_trees(10)
        .unwrap();
    ensemble.train(&features, &targets, &mut rng).unwrap();

    let dir = TempDir::new().unwrap();
    let store = SnapshotStore::new(&dir.path().join("risk.bin"));
    store.save("risk_ensemble", &ensemble).unwrap();
    let restored: RiskEnsemble = store.load("risk_ensemble").unwrap();

    for x in features.iter().take(10) {
        let a = ensemble.predict_vector(x).unwrap();
        let b = restored.predict_vector(x).unwrap();
        assert_eq!(a.weighted_prediction, b.weighted_prediction);
        assert_eq!(a.recommended_action, b.recommended_action);
    }
}
