//! Parsed datasets and the experiment name used for output files.

use lendguard_train::Sample;
use lendguard_tree::FeatureVector;

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'));
        if !valid {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A numeric CSV table: header names and finite row values.
#[derive(Debug, Clone)]
pub struct NumericTable {
    /// Column names from the header, in file order.
    pub columns: Vec<String>,
    /// `rows[row_index][col_index]`, all finite.
    pub rows: Vec<Vec<f64>>,
}

impl NumericTable {
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Position of `name` in the header.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Feature rows with one numeric target each.
///
/// The last CSV column is the target; the others are features. `features[i]`
/// pairs with `targets[i]`.
#[derive(Debug, Clone)]
pub struct LabelledDataset {
    feature_names: Vec<String>,
    target_name: String,
    features: Vec<FeatureVector>,
    targets: Vec<f64>,
}

impl LabelledDataset {
    pub(crate) fn new(
        feature_names: Vec<String>,
        target_name: String,
        features: Vec<FeatureVector>,
        targets: Vec<f64>,
    ) -> Self {
        Self {
            feature_names,
            target_name,
            features,
            targets,
        }
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    #[must_use]
    pub fn features(&self) -> &[FeatureVector] {
        &self.features
    }

    #[must_use]
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Pair every row with its target as a training [`Sample`].
    #[must_use]
    pub fn to_samples(&self) -> Vec<Sample> {
        self.features
            .iter()
            .zip(&self.targets)
            .map(|(x, &y)| Sample::new(x.clone(), y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("q3-default_model".to_string()).unwrap();
        assert_eq!(name.as_str(), "q3-default_model");
        assert_eq!(name.to_string(), "q3-default_model");
    }

    #[test]
    fn experiment_name_rejects_empty_and_special_chars() {
        for bad in ["", "risk model", "../escape", "a/b"] {
            assert!(matches!(
                ExperimentName::new(bad.to_string()),
                Err(IoError::InvalidExperimentName { .. })
            ));
        }
    }

    #[test]
    fn samples_pair_rows_with_targets() {
        let ds = LabelledDataset::new(
            vec!["a".into(), "b".into()],
            "label".into(),
            vec![
                FeatureVector::new(vec![1.0, 2.0]).unwrap(),
                FeatureVector::new(vec![3.0, 4.0]).unwrap(),
            ],
            vec![0.0, 1.0],
        );
        let samples = ds.to_samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].features.as_slice(), &[3.0, 4.0]);
        assert_eq!(samples[1].label, 1.0);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.target_name(), "label");
    }
}
