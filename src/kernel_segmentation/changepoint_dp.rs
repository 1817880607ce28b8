use super::cost::SegmentCostModel;

/// Best segmentation found for one changepoint count
pub(super) struct ChangepointSolution {
    /// Sum of segment costs over all segments
    pub total_cost: f64,

    /// Sorted segment end positions, not including the final data position
    pub changepoints: Vec<usize>,
}

/// Find the minimum cost segmentation for every changepoint count from 0 up to `max_changepoints`
///
/// Changepoints are restricted to the sorted `candidates` list, which makes the search
/// O(max_changepoints * candidates^2) segment cost queries. Entry `c` of the returned vector holds
/// the solution with `c` changepoints. Fewer than `max_changepoints + 1` solutions are returned when
/// there are not enough candidates.
///
/// `candidates` must all be lower than `data_len - 1`.
///
pub(super) fn get_optimal_solutions(
    cost_model: &SegmentCostModel,
    candidates: &[usize],
    max_changepoints: usize,
) -> Vec<ChangepointSolution> {
    let data_len = cost_model.data_len();
    assert!(data_len > 0);
    assert!(candidates.iter().all(|&x| x + 1 < data_len));

    let candidate_count = candidates.len();
    let max_count = max_changepoints.min(candidate_count);

    let mut solutions = Vec::with_capacity(max_count + 1);
    solutions.push(ChangepointSolution {
        total_cost: cost_model.segment_cost(0, data_len - 1),
        changepoints: Vec::new(),
    });
    if max_count == 0 {
        return solutions;
    }

    // layer[j] is the minimum cost of segmenting [0, candidates[j]] with the current changepoint
    // count, where the last changepoint is candidates[j]
    let mut layer = candidates
        .iter()
        .map(|&b| cost_model.segment_cost(0, b))
        .collect::<Vec<_>>();

    // back_pointers[level][j] gives the previous changepoint index for layer `level`. Layer 0 has
    // no previous changepoint so its entry is a placeholder
    let mut back_pointers = vec![Vec::new()];

    for count in 1..=max_count {
        if count > 1 {
            let mut next_layer = vec![f64::INFINITY; candidate_count];
            let mut back = vec![0; candidate_count];
            for j in (count - 1)..candidate_count {
                for i in (count - 2)..j {
                    let value =
                        layer[i] + cost_model.segment_cost(candidates[i] + 1, candidates[j]);
                    if value < next_layer[j] {
                        next_layer[j] = value;
                        back[j] = i;
                    }
                }
            }
            layer = next_layer;
            back_pointers.push(back);
        }

        let mut best_last = count - 1;
        let mut best_total = f64::INFINITY;
        for (j, &b) in candidates.iter().enumerate().skip(count - 1) {
            let total = layer[j] + cost_model.segment_cost(b + 1, data_len - 1);
            if total < best_total {
                best_total = total;
                best_last = j;
            }
        }

        let mut changepoints = Vec::with_capacity(count);
        let mut j = best_last;
        for level in (0..count).rev() {
            changepoints.push(candidates[j]);
            if level > 0 {
                j = back_pointers[level][j];
            }
        }
        changepoints.reverse();

        solutions.push(ChangepointSolution {
            total_cost: best_total,
            changepoints,
        });
    }

    solutions
}

/// Nondecreasing form of `c * ln(N / c)`, taking the running maximum over all counts up to `c`
///
/// The raw term peaks at c = N/e and falls after that, so counts near N would otherwise get a
/// smaller penalty than counts below them.
///
fn get_log_linear_factor(changepoint_count: usize, data_len: usize) -> f64 {
    let n = data_len as f64;
    (1..=changepoint_count)
        .map(|c| {
            let c = c as f64;
            c * (n / c).ln()
        })
        .fold(0.0, f64::max)
}

/// Penalty for a segmentation with `changepoint_count` changepoints over `data_len` points
///
/// `linear * c + log_linear * max_{c' <= c} c' * ln(N / c')`, zero when c is 0. The penalty is
/// nondecreasing in c, so raising either penalty factor never increases the selected count.
///
pub(super) fn get_changepoint_penalty(
    changepoint_count: usize,
    data_len: usize,
    linear_penalty: f64,
    log_linear_penalty: f64,
) -> f64 {
    if changepoint_count == 0 {
        return 0.0;
    }
    let c = changepoint_count as f64;
    linear_penalty * c + log_linear_penalty * get_log_linear_factor(changepoint_count, data_len)
}

/// Index of the solution with the lowest penalized cost, ties going to fewer changepoints
///
pub(super) fn select_penalized_solution(
    total_costs: &[f64],
    data_len: usize,
    linear_penalty: f64,
    log_linear_penalty: f64,
) -> usize {
    let mut best_index = 0;
    let mut best_value = f64::INFINITY;
    for (c, total_cost) in total_costs.iter().enumerate() {
        let value =
            total_cost + get_changepoint_penalty(c, data_len, linear_penalty, log_linear_penalty);
        if value < best_value {
            best_value = value;
            best_index = c;
        }
    }
    best_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel_segmentation::kernel::linear_kernel;
    use crate::kernel_segmentation::low_rank::get_kernel_features;

    fn two_step_data() -> Vec<f64> {
        let mut data = vec![0.0; 5];
        data.extend([5.0; 5]);
        data.extend([0.0; 5]);
        data
    }

    #[test]
    fn test_optimal_solutions() {
        let data = two_step_data();
        let features = get_kernel_features(&data, &linear_kernel, 16, 1216);
        let model = SegmentCostModel::new(&data, &linear_kernel, &features);

        let solutions = get_optimal_solutions(&model, &[2, 4, 9], 5);
        assert_eq!(solutions.len(), 4);

        // No changepoints: scatter of 5 fives among 15 points
        approx::assert_abs_diff_eq!(solutions[0].total_cost, 125.0 - 625.0 / 15.0, epsilon = 1e-9);
        assert!(solutions[0].changepoints.is_empty());

        approx::assert_abs_diff_eq!(solutions[1].total_cost, 62.5, epsilon = 1e-9);
        assert_eq!(solutions[1].changepoints.len(), 1);

        approx::assert_abs_diff_eq!(solutions[2].total_cost, 0.0, epsilon = 1e-9);
        assert_eq!(solutions[2].changepoints, vec![4, 9]);

        approx::assert_abs_diff_eq!(solutions[3].total_cost, 0.0, epsilon = 1e-9);
        assert_eq!(solutions[3].changepoints, vec![2, 4, 9]);

        let total_costs = solutions.iter().map(|x| x.total_cost).collect::<Vec<_>>();
        assert_eq!(select_penalized_solution(&total_costs, data.len(), 1.0, 1.0), 2);
    }

    #[test]
    fn test_no_candidates() {
        let data = two_step_data();
        let features = get_kernel_features(&data, &linear_kernel, 16, 1216);
        let model = SegmentCostModel::new(&data, &linear_kernel, &features);

        let solutions = get_optimal_solutions(&model, &[], 5);
        assert_eq!(solutions.len(), 1);
        assert!(solutions[0].changepoints.is_empty());
    }

    #[test]
    fn test_changepoint_penalty() {
        assert_eq!(get_changepoint_penalty(0, 100, 1.0, 1.0), 0.0);
        approx::assert_ulps_eq!(get_changepoint_penalty(1, 100, 2.0, 0.0), 2.0, max_ulps = 4);
        approx::assert_ulps_eq!(
            get_changepoint_penalty(2, 100, 1.0, 1.0),
            2.0 + 2.0 * 50f64.ln(),
            max_ulps = 4
        );

        // Past N/e the log-linear term holds at its running maximum
        let peak = 2.0 * 2f64.ln();
        approx::assert_ulps_eq!(get_changepoint_penalty(2, 4, 0.0, 1.0), peak, max_ulps = 4);
        approx::assert_ulps_eq!(get_changepoint_penalty(3, 4, 0.0, 1.0), peak, max_ulps = 4);
        approx::assert_ulps_eq!(get_changepoint_penalty(4, 4, 0.0, 1.0), peak, max_ulps = 4);
        approx::assert_ulps_eq!(get_changepoint_penalty(4, 4, 1.0, 1.0), 4.0 + peak, max_ulps = 4);

        for data_len in [2, 5, 17, 100] {
            let penalties = (0..=data_len)
                .map(|c| get_changepoint_penalty(c, data_len, 1.0, 1.0))
                .collect::<Vec<_>>();
            assert!(penalties.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_penalized_selection_near_full_count() {
        // With all 4 points split the raw c * ln(N / c) term is zero, so the full count would
        // otherwise win at every log-linear factor
        let total_costs = [10.0, 6.0, 2.0, 1.9, 1.9];
        assert_eq!(select_penalized_solution(&total_costs, 4, 0.0, 1.0), 3);
        assert_eq!(select_penalized_solution(&total_costs, 4, 0.0, 5.0), 3);
        assert_eq!(select_penalized_solution(&total_costs, 4, 0.0, 8.0), 0);
    }

    #[test]
    fn test_penalized_selection_ties_prefer_fewer() {
        // One changepoint over 10 points with a linear-only penalty costs exactly 1.0
        assert_eq!(select_penalized_solution(&[5.0, 4.0], 10, 1.0, 0.0), 0);
        assert_eq!(select_penalized_solution(&[5.0, 3.5], 10, 1.0, 0.0), 1);
        assert_eq!(select_penalized_solution(&[5.0, 3.5], 10, 0.0, 0.0), 1);
    }
}
