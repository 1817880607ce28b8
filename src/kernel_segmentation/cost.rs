use itertools::Itertools;

use super::low_rank::KernelFeatures;

/// Prefix sums supporting constant time (in data length) segment cost queries
///
/// The cost of segment `[begin, end]` is the within-segment scatter in the kernel feature space:
///
/// `C = sum_i k(x_i, x_i) - |sum_i z_i|^2 / n`
///
pub(super) struct SegmentCostModel {
    dimension: usize,

    /// Prefix sums of the feature vectors, one row per data point plus a leading zero row
    feature_prefix: Vec<f64>,

    /// Prefix sums of the kernel diagonal k(x_i, x_i)
    diagonal_prefix: Vec<f64>,
}

impl SegmentCostModel {
    pub(super) fn new<T, K>(data: &[T], kernel: &K, features: &KernelFeatures) -> Self
    where
        K: Fn(&T, &T) -> f64,
    {
        let dimension = features.dimension;
        let mut feature_prefix = vec![0.0; (data.len() + 1) * dimension];
        let mut diagonal_prefix = vec![0.0; data.len() + 1];

        for (i, x) in data.iter().enumerate() {
            diagonal_prefix[i + 1] = diagonal_prefix[i] + kernel(x, x);
            let (last, next) = feature_prefix[i * dimension..(i + 2) * dimension].split_at_mut(dimension);
            for ((n, l), z) in next.iter_mut().zip(last.iter()).zip(features.row(i)) {
                *n = l + z;
            }
        }

        Self {
            dimension,
            feature_prefix,
            diagonal_prefix,
        }
    }

    pub(super) fn data_len(&self) -> usize {
        self.diagonal_prefix.len() - 1
    }

    /// Cost of the inclusive segment `[begin, end]`
    pub(super) fn segment_cost(&self, begin: usize, end: usize) -> f64 {
        assert!(begin <= end && end < self.data_len());
        let count = (end + 1 - begin) as f64;
        let high = &self.feature_prefix[(end + 1) * self.dimension..(end + 2) * self.dimension];
        let low = &self.feature_prefix[begin * self.dimension..(begin + 1) * self.dimension];
        let sum_squared: f64 = high.iter().zip(low).map(|(h, l)| (h - l) * (h - l)).sum();
        let diagonal = self.diagonal_prefix[end + 1] - self.diagonal_prefix[begin];
        diagonal - sum_squared / count
    }

    /// Cost change from splitting the data after `index` within a local window
    ///
    /// The left segment is `[index + 1 - window_size, index]` and the right segment is
    /// `[index + 1, index + window_size]`, each clipped to the data bounds. The value is never positive
    /// in exact arithmetic, and is more negative for a stronger change between the two segments.
    ///
    pub(super) fn split_cost(&self, index: usize, window_size: usize) -> f64 {
        let begin = (index + 1).saturating_sub(window_size);
        let end = (index + window_size).min(self.data_len() - 1);
        self.segment_cost(begin, index) + self.segment_cost(index + 1, end)
            - self.segment_cost(begin, end)
    }
}

/// Split costs for every candidate changepoint position, `[0, data_len - 2]`
///
pub(super) fn get_window_costs(cost_model: &SegmentCostModel, window_size: usize) -> Vec<f64> {
    let position_count = cost_model.data_len().saturating_sub(1);
    (0..position_count)
        .map(|i| cost_model.split_cost(i, window_size))
        .collect()
}

/// Positions of the local minima in a window cost curve
///
/// Only negative costs qualify. On a plateau of equal values only the first position is reported.
///
pub(super) fn get_local_minima(costs: &[f64]) -> Vec<usize> {
    let last = costs.len().saturating_sub(1);
    costs
        .iter()
        .enumerate()
        .filter(|&(i, &c)| {
            c < 0.0 && (i == 0 || c < costs[i - 1]) && (i == last || c <= costs[i + 1])
        })
        .map(|(i, _)| i)
        .collect()
}

/// Combine the window cost curves into one curve
///
/// Each window's costs are scaled by the window size, so that a change of the same magnitude
/// scores similarly regardless of the window size detecting it, and the minimum over windows is
/// taken at each position.
///
pub(super) fn aggregate_window_costs(window_sizes: &[usize], window_costs: &[Vec<f64>]) -> Vec<f64> {
    let position_count = window_costs.first().map_or(0, |x| x.len());
    (0..position_count)
        .map(|i| {
            window_sizes
                .iter()
                .zip(window_costs)
                .map(|(&w, costs)| costs[i] / w as f64)
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}

/// Select changepoint candidates from the local minima of all window cost curves
///
/// Candidates are ranked on the aggregate cost curve and the best `max_candidate_count` are kept.
/// Returned positions are sorted.
///
pub(super) fn get_changepoint_candidates(
    window_sizes: &[usize],
    window_costs: &[Vec<f64>],
    max_candidate_count: usize,
) -> Vec<usize> {
    let aggregate_costs = aggregate_window_costs(window_sizes, window_costs);

    window_costs
        .iter()
        .flat_map(|x| get_local_minima(x))
        .sorted_unstable()
        .dedup()
        .sorted_by(|&a, &b| aggregate_costs[a].total_cmp(&aggregate_costs[b]).then(a.cmp(&b)))
        .take(max_candidate_count)
        .sorted_unstable()
        .collect()
}
