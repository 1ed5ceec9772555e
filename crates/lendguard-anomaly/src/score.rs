//! Anomaly verdict types.

/// Severity band of an overall anomaly score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Score below 30.
    Normal,
    /// Score in `[30, 70)`.
    Suspicious,
    /// Score of 70 or more.
    Critical,
}

impl Severity {
    /// Band an overall score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 30.0 {
            Severity::Normal
        } else if score < 70.0 {
            Severity::Suspicious
        } else {
            Severity::Critical
        }
    }

    /// The action that accompanies this severity.
    #[must_use]
    pub fn suggested_action(self) -> SuggestedAction {
        match self {
            Severity::Normal => SuggestedAction::Allow,
            Severity::Suspicious => SuggestedAction::Review,
            Severity::Critical => SuggestedAction::Block,
        }
    }
}

/// What the caller should do with the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SuggestedAction {
    Allow,
    Review,
    Block,
}

/// Per-detector scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AlgorithmScores {
    pub z_score: f64,
    pub isolation_forest: f64,
    pub local_outlier_factor: f64,
    pub statistical: f64,
}

impl AlgorithmScores {
    /// Weighted blend: `0.3 z + 0.3 isolation + 0.2 lof + 0.2 statistical`.
    #[must_use]
    pub fn overall(&self) -> f64 {
        self.z_score * 0.3
            + self.isolation_forest * 0.3
            + self.local_outlier_factor * 0.2
            + self.statistical * 0.2
    }
}

/// Full verdict for one transaction.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnomalyScore {
    /// Weighted blend of the detector scores, in `[0, 100]`.
    pub overall_score: f64,
    /// `overall_score > 50`.
    pub is_anomaly: bool,
    pub severity: Severity,
    pub algorithms: AlgorithmScores,
    /// Human-readable explanations; never empty.
    pub reasons: Vec<String>,
    pub suggested_action: SuggestedAction,
}

impl AnomalyScore {
    /// Assemble a verdict from detector scores and reasons.
    #[must_use]
    pub fn from_algorithms(algorithms: AlgorithmScores, reasons: Vec<String>) -> Self {
        let overall_score = algorithms.overall().clamp(0.0, 100.0);
        let severity = Severity::from_score(overall_score);
        Self {
            overall_score,
            is_anomaly: overall_score > 50.0,
            severity,
            algorithms,
            reasons,
            suggested_action: severity.suggested_action(),
        }
    }
}
