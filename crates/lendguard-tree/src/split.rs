use crate::node::FeatureIndex;

/// Gains at or below this are treated as no improvement.
const MIN_GAIN: f64 = 1e-12;

/// Result of finding the best split for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    /// Parent variance minus the size-weighted child variance.
    pub(crate) gain: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Find the variance-reducing split with the highest gain.
///
/// Every feature is scanned in ascending order. For each, the samples are
/// sorted by value and every distinct value that leaves both sides
/// non-empty is tried as a `<=` threshold. Squared-error sums are kept
/// incrementally, centred on the parent mean.
///
/// Ties keep the first candidate: lower feature index, then lower threshold.
/// Returns `None` when no candidate improves on zero gain.
///
/// # Column-major layout
///
/// `features[feature_idx][sample_idx]`; `sample_indices` index the inner vectors.
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    targets: &[f64],
    sample_indices: &[usize],
) -> Option<SplitResult> {
    let n_samples = sample_indices.len();
    if n_samples < 2 || features.is_empty() {
        return None;
    }
    let n = n_samples as f64;

    let parent_mean = sample_indices.iter().map(|&si| targets[si]).sum::<f64>() / n;
    let (total_sum, total_sq) = sample_indices.iter().fold((0.0, 0.0), |(s, q), &si| {
        let d = targets[si] - parent_mean;
        (s + d, q + d * d)
    });
    let parent_sse = total_sq - total_sum * total_sum / n;
    if parent_sse <= 0.0 {
        return None;
    }

    let mut best_gain = 0.0f64;
    let mut best: Option<(usize, f64)> = None;

    for (feat_idx, column) in features.iter().enumerate() {
        let mut sorted: Vec<(f64, f64)> = sample_indices
            .iter()
            .map(|&si| (column[si], targets[si] - parent_mean))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for i in 0..(n_samples - 1) {
            let (value, d) = sorted[i];
            left_sum += d;
            left_sq += d * d;

            // Only cut between distinct values.
            if value == sorted[i + 1].0 {
                continue;
            }

            let n_left = (i + 1) as f64;
            let n_right = n - n_left;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let left_sse = (left_sq - left_sum * left_sum / n_left).max(0.0);
            let right_sse = (right_sq - right_sum * right_sum / n_right).max(0.0);

            let gain = (parent_sse - left_sse - right_sse) / n;
            if gain > best_gain + MIN_GAIN {
                best_gain = gain;
                best = Some((feat_idx, value));
            }
        }
    }

    let (feat_idx, threshold) = best?;
    let column = &features[feat_idx];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
        .iter()
        .copied()
        .partition(|&si| column[si] <= threshold);

    Some(SplitResult {
        feature: FeatureIndex::new(feat_idx),
        threshold,
        gain: best_gain,
        left_indices,
        right_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_obvious_threshold() {
        let features = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let targets = vec![0.0, 0.0, 0.0, 100.0, 100.0, 100.0];
        let indices: Vec<usize> = (0..6).collect();
        let split = find_best_split(&features, &targets, &indices).unwrap();
        assert_eq!(split.feature.index(), 0);
        assert!((split.threshold - 3.0).abs() < f64::EPSILON);
        assert_eq!(split.left_indices, vec![0, 1, 2]);
        assert_eq!(split.right_indices, vec![3, 4, 5]);
        // Parent variance 2500, children are pure.
        assert!((split.gain - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn constant_targets_have_no_split() {
        let features = vec![vec![1.0, 2.0, 3.0]];
        let targets = vec![7.0, 7.0, 7.0];
        let indices: Vec<usize> = (0..3).collect();
        assert!(find_best_split(&features, &targets, &indices).is_none());
    }

    #[test]
    fn constant_feature_has_no_split() {
        let features = vec![vec![5.0, 5.0, 5.0]];
        let targets = vec![1.0, 2.0, 3.0];
        let indices: Vec<usize> = (0..3).collect();
        assert!(find_best_split(&features, &targets, &indices).is_none());
    }

    #[test]
    fn ties_prefer_first_feature() {
        // Both features separate the targets identically.
        let features = vec![vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 1.0, 1.0]];
        let targets = vec![10.0, 10.0, 90.0, 90.0];
        let indices: Vec<usize> = (0..4).collect();
        let split = find_best_split(&features, &targets, &indices).unwrap();
        assert_eq!(split.feature.index(), 0);
    }

    #[test]
    fn respects_subset_of_indices() {
        let features = vec![vec![1.0, 2.0, 3.0, 4.0]];
        let targets = vec![0.0, 50.0, 50.0, 100.0];
        let split = find_best_split(&features, &targets, &[0, 3]).unwrap();
        assert_eq!(split.left_indices, vec![0]);
        assert_eq!(split.right_indices, vec![3]);
    }
}
