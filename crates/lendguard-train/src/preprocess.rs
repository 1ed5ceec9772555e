//! Column scaling, variance-based selection and feature expansion.

use lendguard_tree::FeatureVector;

use crate::TrainError;

/// Default cut-off for [`select_by_variance`].
pub const DEFAULT_VARIANCE_THRESHOLD: f64 = 0.01;

/// Rows rescaled to `[0, 1]` with the per-column bounds used.
#[derive(Debug, Clone)]
pub struct MinMaxScaling {
    pub data: Vec<FeatureVector>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

/// Rows standardized to zero mean and unit variance with the per-column moments used.
#[derive(Debug, Clone)]
pub struct Standardization {
    pub data: Vec<FeatureVector>,
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

/// Return the shared arity of `data`.
fn arity(data: &[FeatureVector]) -> Result<usize, TrainError> {
    let expected = data.first().ok_or(TrainError::EmptyDataset)?.len();
    for (sample_index, row) in data.iter().enumerate() {
        if row.len() != expected {
            return Err(TrainError::FeatureCountMismatch {
                expected,
                got: row.len(),
                sample_index,
            });
        }
    }
    Ok(expected)
}

fn column_means(data: &[FeatureVector], n_features: usize) -> Vec<f64> {
    let mut mean = vec![0.0; n_features];
    for row in data {
        for (m, v) in mean.iter_mut().zip(row.as_slice()) {
            *m += v;
        }
    }
    mean.iter_mut().for_each(|m| *m /= data.len() as f64);
    mean
}

fn column_std(data: &[FeatureVector], mean: &[f64]) -> Vec<f64> {
    let mut var = vec![0.0; mean.len()];
    for row in data {
        for ((s, v), m) in var.iter_mut().zip(row.as_slice()).zip(mean) {
            *s += (v - m).powi(2);
        }
    }
    var.iter().map(|s| (s / data.len() as f64).sqrt()).collect()
}

fn map_rows(
    data: &[FeatureVector],
    f: impl Fn(&[f64]) -> Vec<f64>,
) -> Result<Vec<FeatureVector>, TrainError> {
    data.iter()
        .map(|row| FeatureVector::new(f(row.as_slice())).map_err(TrainError::from))
        .collect()
}

/// Rescale each column to `[0, 1]`; constant columns become 0.
///
/// # Errors
///
/// Returns [`TrainError::EmptyDataset`] or [`TrainError::FeatureCountMismatch`].
pub fn min_max_normalize(data: &[FeatureVector]) -> Result<MinMaxScaling, TrainError> {
    let n_features = arity(data)?;
    let mut min = vec![f64::INFINITY; n_features];
    let mut max = vec![f64::NEG_INFINITY; n_features];
    for row in data {
        for (j, &v) in row.as_slice().iter().enumerate() {
            min[j] = min[j].min(v);
            max[j] = max[j].max(v);
        }
    }
    let scaled = map_rows(data, |row| {
        row.iter()
            .enumerate()
            .map(|(j, v)| {
                let range = max[j] - min[j];
                if range == 0.0 { 0.0 } else { (v - min[j]) / range }
            })
            .collect()
    })?;
    Ok(MinMaxScaling {
        data: scaled,
        min,
        max,
    })
}

/// Center and scale each column by its population moments; zero-variance columns become 0.
///
/// # Errors
///
/// Returns [`TrainError::EmptyDataset`] or [`TrainError::FeatureCountMismatch`].
pub fn standardize(data: &[FeatureVector]) -> Result<Standardization, TrainError> {
    let n_features = arity(data)?;
    let mean = column_means(data, n_features);
    let std = column_std(data, &mean);
    let scaled = map_rows(data, |row| {
        row.iter()
            .zip(mean.iter().zip(&std))
            .map(|(v, (m, s))| if *s == 0.0 { 0.0 } else { (v - m) / s })
            .collect()
    })?;
    Ok(Standardization {
        data: scaled,
        mean,
        std,
    })
}

/// Indices of columns whose population variance exceeds `threshold`.
///
/// # Errors
///
/// Returns [`TrainError::EmptyDataset`] or [`TrainError::FeatureCountMismatch`].
pub fn select_by_variance(data: &[FeatureVector], threshold: f64) -> Result<Vec<usize>, TrainError> {
    let n_features = arity(data)?;
    let mean = column_means(data, n_features);
    Ok(column_std(data, &mean)
        .iter()
        .enumerate()
        .filter(|(_, s)| s.powi(2) > threshold)
        .map(|(j, _)| j)
        .collect())
}

/// Append powers 2 through `degree` of every feature, grouped by power.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`TrainError::InvalidDegree`] | `degree` is 0 |
/// | [`TrainError::EmptyDataset`] | no rows |
/// | [`TrainError::FeatureCountMismatch`] | inconsistent row lengths |
/// | [`TrainError::Feature`] | a power overflows to infinity |
pub fn polynomial_features(
    data: &[FeatureVector],
    degree: u32,
) -> Result<Vec<FeatureVector>, TrainError> {
    if degree == 0 {
        return Err(TrainError::InvalidDegree { degree });
    }
    arity(data)?;
    let exponents: Vec<i32> = (2..=degree).filter_map(|d| i32::try_from(d).ok()).collect();
    map_rows(data, |row| {
        let mut out = row.to_vec();
        for &d in &exponents {
            out.extend(row.iter().map(|v| v.powi(d)));
        }
        out
    })
}

/// Append the product of every feature pair `(i, j)` with `i < j`.
///
/// # Errors
///
/// Returns [`TrainError::EmptyDataset`], [`TrainError::FeatureCountMismatch`],
/// or [`TrainError::Feature`] when a product overflows.
pub fn interaction_features(data: &[FeatureVector]) -> Result<Vec<FeatureVector>, TrainError> {
    arity(data)?;
    map_rows(data, |row| {
        let mut out = row.to_vec();
        for i in 0..row.len() {
            for j in (i + 1)..row.len() {
                out.push(row[i] * row[j]);
            }
        }
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: &[&[f64]]) -> Vec<FeatureVector> {
        values
            .iter()
            .map(|r| FeatureVector::new(r.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn min_max_handles_constant_columns() {
        let scaled = min_max_normalize(&rows(&[&[0.0, 5.0], &[10.0, 5.0], &[5.0, 5.0]])).unwrap();
        assert_eq!(scaled.data[1].as_slice(), &[1.0, 0.0]);
        assert_eq!(scaled.data[2].as_slice(), &[0.5, 0.0]);
        assert_eq!(scaled.min, vec![0.0, 5.0]);
        assert_eq!(scaled.max, vec![10.0, 5.0]);
    }

    #[test]
    fn standardize_centers_columns() {
        let out = standardize(&rows(&[&[1.0, 3.0], &[3.0, 3.0]])).unwrap();
        assert_eq!(out.mean, vec![2.0, 3.0]);
        assert_eq!(out.std, vec![1.0, 0.0]);
        assert_eq!(out.data[0].as_slice(), &[-1.0, 0.0]);
        assert_eq!(out.data[1].as_slice(), &[1.0, 0.0]);
    }

    #[test]
    fn variance_selection() {
        let data = rows(&[&[0.0, 1.0, 0.0], &[1.0, 1.0, 0.1], &[2.0, 1.0, 0.0]]);
        assert_eq!(select_by_variance(&data, DEFAULT_VARIANCE_THRESHOLD).unwrap(), vec![0]);
    }

    #[test]
    fn polynomial_groups_by_power() {
        let out = polynomial_features(&rows(&[&[2.0, 3.0]]), 3).unwrap();
        assert_eq!(out[0].as_slice(), &[2.0, 3.0, 4.0, 9.0, 8.0, 27.0]);
        let same = polynomial_features(&rows(&[&[2.0, 3.0]]), 1).unwrap();
        assert_eq!(same[0].as_slice(), &[2.0, 3.0]);
        assert!(polynomial_features(&rows(&[&[2.0]]), 0).is_err());
    }

    #[test]
    fn interactions_append_pairs() {
        let out = interaction_features(&rows(&[&[2.0, 3.0, 5.0]])).unwrap();
        assert_eq!(out[0].as_slice(), &[2.0, 3.0, 5.0, 6.0, 10.0, 15.0]);
    }

    #[test]
    fn empty_and_ragged_inputs_rejected() {
        assert!(matches!(standardize(&[]), Err(TrainError::EmptyDataset)));
        assert!(matches!(
            min_max_normalize(&rows(&[&[1.0], &[1.0, 2.0]])),
            Err(TrainError::FeatureCountMismatch { sample_index: 1, .. })
        ));
    }

    #[test]
    fn overflowing_powers_rejected() {
        let err = polynomial_features(&rows(&[&[1e200]]), 2).unwrap_err();
        assert!(matches!(err, TrainError::Feature(_)));
    }
}
