//! Local outlier factor scoring against a reference set.

use lendguard_tree::FeatureVector;

use crate::AnomalyError;

/// How neighbor reachability is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum LofMode {
    /// Every neighbor is assumed to share the query's mean reachability
    /// distance, so the ratio is 1 whenever that distance is positive and
    /// the score is 0.
    #[default]
    Simplified,
    /// Textbook LOF: neighbors' k-distances and local reachability
    /// densities are computed within the reference set.
    Exact,
}

/// Local outlier factor detector.
///
/// The reference set is the detector's training history; the query's
/// `k` nearest reference points are its neighborhood.
///
/// # Defaults
///
/// | Parameter | Default       |
/// |-----------|---------------|
/// | `k`       | 5             |
/// | `mode`    | `Simplified`  |
#[derive(Debug, Clone, Copy)]
pub struct LocalOutlierFactor {
    k: usize,
    mode: LofMode,
}

impl LocalOutlierFactor {
    /// Create a detector with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            k: 5,
            mode: LofMode::Simplified,
        }
    }

    /// Set the neighborhood size.
    ///
    /// # Errors
    ///
    /// Returns [`AnomalyError::InvalidNeighborCount`] when `k` is 0.
    pub fn with_k(mut self, k: usize) -> Result<Self, AnomalyError> {
        if k == 0 {
            return Err(AnomalyError::InvalidNeighborCount { k });
        }
        self.k = k;
        Ok(self)
    }

    /// Set the reachability mode.
    #[must_use]
    pub fn with_mode(mut self, mode: LofMode) -> Self {
        self.mode = mode;
        self
    }

    /// Return the neighborhood size.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Return the reachability mode.
    #[must_use]
    pub fn mode(&self) -> LofMode {
        self.mode
    }

    /// Score `point` in `[0, 100]` as `clamp((lof - 1) * 50, 0, 100)`.
    ///
    /// An empty reference set yields 0.
    #[must_use]
    pub fn detect(&self, point: &FeatureVector, reference: &[FeatureVector]) -> f64 {
        if reference.is_empty() {
            return 0.0;
        }
        let lof = match self.mode {
            LofMode::Simplified => self.simplified_lof(point, reference),
            LofMode::Exact => self.exact_lof(point, reference),
        };
        ((lof - 1.0) * 50.0).clamp(0.0, 100.0)
    }

    fn simplified_lof(&self, point: &FeatureVector, reference: &[FeatureVector]) -> f64 {
        let neighbors = nearest(point.as_slice(), reference, self.k, None);
        let k_dist = neighbors.last().map_or(0.0, |&(_, d)| d);
        let reach = neighbors.iter().map(|&(_, d)| d.max(k_dist)).sum::<f64>()
            / neighbors.len() as f64;
        let neighbor_reach = reach;
        if reach > 0.0 && neighbor_reach > 0.0 {
            neighbor_reach / reach
        } else {
            1.0
        }
    }

    fn exact_lof(&self, point: &FeatureVector, reference: &[FeatureVector]) -> f64 {
        let neighbors = nearest(point.as_slice(), reference, self.k, None);
        let query_reach = self.mean_reach(&neighbors, reference);
        if query_reach == 0.0 {
            return 1.0;
        }

        let mut density_sum = 0.0;
        for &(idx, _) in &neighbors {
            let own = nearest(reference[idx].as_slice(), reference, self.k, Some(idx));
            let reach = self.mean_reach(&own, reference);
            if reach == 0.0 {
                return f64::INFINITY;
            }
            density_sum += 1.0 / reach;
        }
        // lof = mean(lrd(o)) / lrd(q), with lrd = 1 / mean reachability.
        query_reach * density_sum / neighbors.len() as f64
    }

    /// Mean reachability distance from a point to its neighbors.
    fn mean_reach(&self, neighbors: &[(usize, f64)], reference: &[FeatureVector]) -> f64 {
        if neighbors.is_empty() {
            return 0.0;
        }
        neighbors
            .iter()
            .map(|&(idx, d)| d.max(self.k_distance(idx, reference)))
            .sum::<f64>()
            / neighbors.len() as f64
    }

    /// Distance from a reference point to its k-th nearest other reference point.
    fn k_distance(&self, idx: usize, reference: &[FeatureVector]) -> f64 {
        nearest(reference[idx].as_slice(), reference, self.k, Some(idx))
            .last()
            .map_or(0.0, |&(_, d)| d)
    }
}

impl Default for LocalOutlierFactor {
    fn default() -> Self {
        Self::new()
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// The `k` nearest reference points as `(index, distance)`, closest first.
fn nearest(
    point: &[f64],
    reference: &[FeatureVector],
    k: usize,
    exclude: Option<usize>,
) -> Vec<(usize, f64)> {
    let mut distances: Vec<(usize, f64)> = reference
        .iter()
        .enumerate()
        .filter(|&(i, _)| Some(i) != exclude)
        .map(|(i, r)| (i, euclidean(point, r.as_slice())))
        .collect();
    distances.sort_by(|a, b| a.1.total_cmp(&b.1));
    distances.truncate(k);
    distances
}
