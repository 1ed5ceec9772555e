//! JSON result writer for training runs.

use std::fs;
use std::path::{Path, PathBuf};

use lendguard_train::{
    CrossValidationResult, HyperparameterTuningResult, ModelTrainingConfig, TrainingMetrics,
    TrainingSummary,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::domain::ExperimentName;
use crate::IoError;

/// Everything a training run produced, borrowed for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport<'a> {
    pub feature_names: &'a [String],
    pub config: &'a ModelTrainingConfig,
    pub history: &'a [TrainingMetrics],
    pub summary: Option<TrainingSummary>,
    pub cross_validation: Option<&'a CrossValidationResult>,
    pub tuning: Option<&'a HyperparameterTuningResult>,
}

/// Writes run artifacts to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Training output is named `{experiment}_training.json`.
#[derive(Debug)]
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write a training report to `{experiment}_training.json` and return its path.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::JsonEncode`] | the report cannot be encoded |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all, fields(epochs = report.history.len()))]
    pub fn write_training(&self, report: &TrainingReport<'_>) -> Result<PathBuf, IoError> {
        let path = self.training_path();
        let artifact = TrainingArtifact {
            experiment: self.experiment.as_str(),
            report,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::JsonEncode {
            artifact: "training report",
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "training result written");
        Ok(path)
    }

    /// `{output_dir}/{experiment}_training.json`. Does not write anything.
    #[must_use]
    pub fn training_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_training.json", self.experiment.as_str()))
    }
}

#[derive(Serialize)]
struct TrainingArtifact<'a> {
    experiment: &'a str,
    #[serde(flatten)]
    report: &'a TrainingReport<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use lendguard_train::{FeatureVector, Sample, Trainer};
    use tempfile::TempDir;

    fn samples() -> Vec<Sample> {
        (0..20)
            .map(|i| {
                let x = i as f64 / 20.0;
                Sample::new(
                    FeatureVector::new(vec![x]).unwrap(),
                    if x > 0.5 { 1.0 } else { 0.0 },
                )
            })
            .collect()
    }

    #[test]
    fn write_training_json_structure() {
        let dir = TempDir::new().unwrap();
        let experiment = ExperimentName::new("credit_v1".into()).unwrap();
        let writer = ResultWriter::new(dir.path(), experiment).unwrap();

        let config = ModelTrainingConfig::new(3, 4).unwrap();
        let mut trainer = Trainer::logistic(1);
        trainer.train_model(&samples(), &config).unwrap();
        let names = vec!["utilization".to_string()];
        let report = TrainingReport {
            feature_names: &names,
            config: &config,
            history: trainer.history(),
            summary: trainer.summary(),
            cross_validation: None,
            tuning: None,
        };
        let path = writer.write_training(&report).unwrap();
        assert_eq!(path, dir.path().join("credit_v1_training.json"));

        let content: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content["experiment"], "credit_v1");
        assert_eq!(content["feature_names"][0], "utilization");
        assert_eq!(content["config"]["epochs"], 3);
        assert_eq!(content["history"].as_array().unwrap().len(), 3);
        assert!(content["summary"]["best_loss"].is_number());
        assert!(content["cross_validation"].is_null());
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("runs").join("2026");
        let experiment = ExperimentName::new("nested".into()).unwrap();
        let writer = ResultWriter::new(&nested, experiment).unwrap();
        assert!(nested.is_dir());
        assert_eq!(writer.training_path(), nested.join("nested_training.json"));
    }
}
