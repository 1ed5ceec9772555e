//! Validated feature vectors.

use std::ops::Index;

use crate::error::TreeError;

/// An ordered, immutable sequence of finite feature values.
///
/// Values are expected to be pre-normalized to roughly `[0, 100]`, but only
/// finiteness is enforced. A zero-length vector is valid; models reject it
/// through their own arity checks.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// Create a feature vector, validating that every value is finite.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(values: Vec<f64>) -> Result<Self, TreeError> {
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(TreeError::NonFiniteValue { index });
        }
        Ok(Self(values))
    }

    /// Return the number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the vector has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the value at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Borrow the values as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Consume and return the inner vector.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl TryFrom<Vec<f64>> for FeatureVector {
    type Error = TreeError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<FeatureVector> for Vec<f64> {
    fn from(vector: FeatureVector) -> Self {
        vector.0
    }
}

/// Check that every vector in `rows` has the same arity as the first.
///
/// Returns the common arity (0 for an empty slice).
pub(crate) fn common_arity(rows: &[FeatureVector]) -> Result<usize, TreeError> {
    let Some(first) = rows.first() else {
        return Ok(0);
    };
    let expected = first.len();
    for (sample_index, row) in rows.iter().enumerate() {
        if row.len() != expected {
            return Err(TreeError::FeatureCountMismatch {
                expected,
                got: row.len(),
                sample_index,
            });
        }
    }
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_finite_values() {
        let v = FeatureVector::new(vec![1.0, 50.0, 100.0]).unwrap();
        assert_eq!(v.len(), 3);
        assert_eq!(v[1], 50.0);
        assert_eq!(v.get(3), None);
    }

    #[test]
    fn accepts_empty() {
        let v = FeatureVector::new(vec![]).unwrap();
        assert!(v.is_empty());
    }

    #[test]
    fn rejects_nan() {
        let err = FeatureVector::new(vec![1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, TreeError::NonFiniteValue { index: 1 }));
    }

    #[test]
    fn rejects_infinity() {
        let err = FeatureVector::try_from(vec![f64::INFINITY]).unwrap_err();
        assert!(matches!(err, TreeError::NonFiniteValue { index: 0 }));
    }

    #[test]
    fn json_rejects_non_finite_through_try_from() {
        let v: FeatureVector = serde_json::from_str("[1.0, 2.5]").unwrap();
        assert_eq!(v.as_slice(), &[1.0, 2.5]);
        assert_eq!(serde_json::to_string(&v).unwrap(), "[1.0,2.5]");
    }

    #[test]
    fn common_arity_detects_ragged_rows() {
        let rows = vec![
            FeatureVector::new(vec![1.0, 2.0]).unwrap(),
            FeatureVector::new(vec![1.0]).unwrap(),
        ];
        let err = common_arity(&rows).unwrap_err();
        assert!(matches!(
            err,
            TreeError::FeatureCountMismatch { expected: 2, got: 1, sample_index: 1 }
        ));
        assert_eq!(common_arity(&[]).unwrap(), 0);
    }
}
