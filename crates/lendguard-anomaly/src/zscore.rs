use crate::AnomalyError;

/// Scores how many standard deviations a value sits from its mean.
///
/// A deviation equal to `threshold` standard deviations maps to 100.
///
/// # Defaults
///
/// | Parameter   | Default |
/// |-------------|---------|
/// | `threshold` | 2.5     |
#[derive(Debug, Clone, Copy)]
pub struct ZScoreDetector {
    threshold: f64,
}

impl ZScoreDetector {
    /// Create a detector with the default threshold.
    #[must_use]
    pub fn new() -> Self {
        Self { threshold: 2.5 }
    }

    /// Set the number of standard deviations that maps to a full score.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError::InvalidThreshold`] unless `threshold` is finite and positive.
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, AnomalyError> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(AnomalyError::InvalidThreshold { threshold });
        }
        self.threshold = threshold;
        Ok(self)
    }

    /// Return the threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `min(100, |value - mean| / std_dev / threshold * 100)`, or 0 when `std_dev` is 0.
    #[must_use]
    pub fn detect(&self, value: f64, mean: f64, std_dev: f64) -> f64 {
        if std_dev == 0.0 {
            return 0.0;
        }
        let z = ((value - mean) / std_dev).abs();
        (z / self.threshold * 100.0).min(100.0)
    }
}

impl Default for ZScoreDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_std_dev_scores_zero() {
        assert_eq!(ZScoreDetector::new().detect(1e6, 0.0, 0.0), 0.0);
    }

    #[test]
    fn scales_linearly_until_cap() {
        let d = ZScoreDetector::new();
        assert!((d.detect(110.0, 100.0, 10.0) - 40.0).abs() < 1e-12);
        assert!((d.detect(75.0, 100.0, 10.0) - 100.0).abs() < 1e-12);
        assert_eq!(d.detect(1_000.0, 100.0, 10.0), 100.0);
    }

    #[test]
    fn rejects_non_positive_threshold() {
        assert!(ZScoreDetector::new().with_threshold(0.0).is_err());
        let d = ZScoreDetector::new().with_threshold(5.0).unwrap();
        assert!((d.detect(110.0, 100.0, 10.0) - 20.0).abs() < 1e-12);
    }
}
