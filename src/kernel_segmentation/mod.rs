//! Kernel changepoint segmentation
//!
//! Changepoints are found in an ordered sequence of data points by minimizing the within-segment
//! scatter in a kernel feature space, plus a penalty on the changepoint count. The method follows
//! these steps:
//!
//! 1. Map all points into a low-rank kernel feature space built from a seeded data subsample.
//! 2. For each window size, score every position by how much a split there reduces the local cost.
//! 3. Take the local minima of the window cost curves as changepoint candidates, ranked on the
//!    aggregate of all window cost curves.
//! 4. Find the exact minimum cost segmentation over the candidates for each changepoint count.
//! 5. Select the changepoint count with the lowest penalized cost.
//!

mod changepoint_dp;
mod cost;
pub mod kernel;
mod low_rank;

use log::debug;
use serde::Serialize;

use self::changepoint_dp::{get_optimal_solutions, select_penalized_solution};
use self::cost::{SegmentCostModel, get_changepoint_candidates, get_window_costs};
use self::low_rank::get_kernel_features;
use crate::errors::{Result, bail_param};
pub use kernel::{gaussian_kernel, linear_kernel};

/// Default random seed for the kernel approximation subsample
pub const DEFAULT_SEED: u64 = 1216;

/// Numeric settings for kernel changepoint segmentation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KernelSegmenterSettings {
    /// Upper bound on the number of changepoints reported
    pub max_changepoints: usize,

    /// Subsample size used to build the low-rank kernel approximation
    pub approximation_dimension: usize,

    /// Half-widths of the local windows used to find changepoint candidates
    pub window_sizes: Vec<usize>,

    /// Penalty factor per changepoint
    pub linear_penalty: f64,

    /// Penalty factor per changepoint scaled by log(N / changepoint_count)
    pub log_linear_penalty: f64,

    pub seed: u64,
}

impl Default for KernelSegmenterSettings {
    fn default() -> Self {
        Self {
            max_changepoints: 100,
            approximation_dimension: 100,
            window_sizes: vec![8, 16, 32, 64],
            linear_penalty: 1.0,
            log_linear_penalty: 1.0,
            seed: DEFAULT_SEED,
        }
    }
}

fn validate_penalty(label: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && (value == 0.0 || value >= 1.0)) {
        bail_param!("{label} penalty must be 0 or >= 1, found {value}");
    }
    Ok(())
}

impl KernelSegmenterSettings {
    pub fn validate(&self) -> Result<()> {
        if self.approximation_dimension == 0 {
            bail_param!("Kernel approximation dimension must be > 0");
        }
        if self.window_sizes.is_empty() {
            bail_param!("At least one window size is required");
        }
        for (i, &window_size) in self.window_sizes.iter().enumerate() {
            if window_size == 0 {
                bail_param!("Window sizes must be > 0");
            }
            if self.window_sizes[..i].contains(&window_size) {
                bail_param!("Window sizes must be unique, found duplicate size {window_size}");
            }
        }
        validate_penalty("Linear", self.linear_penalty)?;
        validate_penalty("Log-linear", self.log_linear_penalty)?;
        Ok(())
    }
}

/// Find changepoints in `data` with the given kernel
///
/// Each returned index is the last position of a segment, so that a changepoint `i` separates
/// `data[i]` from `data[i + 1]`. Indices are sorted and there are at most `max_changepoints` of
/// them.
///
/// All parameters are validated before the data are processed. An empty result is returned when
/// `max_changepoints` is 0 or there are fewer than 2 data points.
///
pub fn find_changepoints<T, K>(
    data: &[T],
    max_changepoints: usize,
    kernel: K,
    approximation_dimension: usize,
    window_sizes: &[usize],
    linear_penalty: f64,
    log_linear_penalty: f64,
) -> Result<Vec<usize>>
where
    K: Fn(&T, &T) -> f64,
{
    let settings = KernelSegmenterSettings {
        max_changepoints,
        approximation_dimension,
        window_sizes: window_sizes.to_vec(),
        linear_penalty,
        log_linear_penalty,
        seed: DEFAULT_SEED,
    };
    find_changepoints_with_settings(data, kernel, &settings)
}

/// Find changepoints in `data` with all numeric parameters given by `settings`
///
/// This is the same as [find_changepoints], with control over the subsample seed.
///
pub fn find_changepoints_with_settings<T, K>(
    data: &[T],
    kernel: K,
    settings: &KernelSegmenterSettings,
) -> Result<Vec<usize>>
where
    K: Fn(&T, &T) -> f64,
{
    settings.validate()?;

    let data_len = data.len();
    if settings.max_changepoints == 0 || data_len < 2 {
        return Ok(Vec::new());
    }

    let features = get_kernel_features(
        data,
        &kernel,
        settings.approximation_dimension,
        settings.seed,
    );
    let cost_model = SegmentCostModel::new(data, &kernel, &features);

    let window_costs = settings
        .window_sizes
        .iter()
        .map(|&w| get_window_costs(&cost_model, w))
        .collect::<Vec<_>>();

    let max_candidate_count = settings
        .window_sizes
        .len()
        .saturating_mul(settings.max_changepoints);
    let candidates =
        get_changepoint_candidates(&settings.window_sizes, &window_costs, max_candidate_count);
    if candidates.is_empty() {
        debug!("No changepoint candidates found in {data_len} data points");
        return Ok(Vec::new());
    }

    let mut solutions = get_optimal_solutions(&cost_model, &candidates, settings.max_changepoints);
    let total_costs = solutions.iter().map(|x| x.total_cost).collect::<Vec<_>>();
    let selected = select_penalized_solution(
        &total_costs,
        data_len,
        settings.linear_penalty,
        settings.log_linear_penalty,
    );

    debug!(
        "Selected {selected} changepoints from {} candidates in {data_len} data points",
        candidates.len()
    );

    Ok(std::mem::take(&mut solutions[selected].changepoints))
}

/// Inclusive `(begin, end)` segment ranges implied by a sorted changepoint list
///
/// ```
/// use pairseg::kernel_segmentation::ChangepointSegments;
///
/// let segments = ChangepointSegments::new(&[2, 5], 8).collect::<Vec<_>>();
/// assert_eq!(segments, vec![(0, 2), (3, 5), (6, 7)]);
/// ```
pub struct ChangepointSegments<'a> {
    changepoints: std::slice::Iter<'a, usize>,
    begin: usize,
    data_len: usize,
}

impl<'a> ChangepointSegments<'a> {
    pub fn new(changepoints: &'a [usize], data_len: usize) -> Self {
        Self {
            changepoints: changepoints.iter(),
            begin: 0,
            data_len,
        }
    }
}

impl Iterator for ChangepointSegments<'_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.begin >= self.data_len {
            return None;
        }
        let end = match self.changepoints.next() {
            Some(&x) => x.min(self.data_len - 1),
            None => self.data_len - 1,
        };
        let segment = (self.begin, end);
        self.begin = end + 1;
        Some(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use unwrap::unwrap;

    /// Piecewise constant levels with uniform noise
    fn get_step_data(levels: &[(f64, usize)], noise: f64, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        levels
            .iter()
            .flat_map(|&(level, len)| std::iter::repeat_n(level, len))
            .map(|x| x + rng.gen_range(-noise..=noise))
            .collect()
    }

    #[test]
    fn test_settings_validation() {
        assert!(KernelSegmenterSettings::default().validate().is_ok());

        let check = |f: fn(&mut KernelSegmenterSettings)| {
            let mut settings = KernelSegmenterSettings::default();
            f(&mut settings);
            matches!(settings.validate(), Err(Error::InvalidParameter(_)))
        };
        assert!(check(|x| x.approximation_dimension = 0));
        assert!(check(|x| x.window_sizes = vec![]));
        assert!(check(|x| x.window_sizes = vec![8, 0]));
        assert!(check(|x| x.window_sizes = vec![8, 8, 16]));
        assert!(check(|x| x.linear_penalty = 0.5));
        assert!(check(|x| x.linear_penalty = -1.0));
        assert!(check(|x| x.log_linear_penalty = f64::INFINITY));
        assert!(!check(|x| x.linear_penalty = 0.0));
        assert!(!check(|x| x.log_linear_penalty = 1.0));
    }

    #[test]
    fn test_duplicate_window_sizes_fail_before_processing() {
        let result = find_changepoints(&[0.0f64; 0], 10, linear_kernel, 10, &[8, 8, 16], 1.0, 1.0);
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_trivial_inputs() {
        let windows = [4, 8];
        let empty: Vec<usize> = Vec::new();
        assert_eq!(
            unwrap!(find_changepoints(&[1.0], 10, linear_kernel, 10, &windows, 1.0, 1.0)),
            empty
        );
        let data = get_step_data(&[(0.0, 20), (10.0, 20)], 0.1, 1);
        assert_eq!(
            unwrap!(find_changepoints(&data, 0, linear_kernel, 10, &windows, 1.0, 1.0)),
            empty
        );

        // Constant data
        let data = vec![3.0; 50];
        assert_eq!(
            unwrap!(find_changepoints(&data, 10, linear_kernel, 10, &windows, 1.0, 1.0)),
            empty
        );
    }

    #[test]
    fn test_mean_shift_linear_kernel() {
        let data = get_step_data(&[(0.0, 50), (5.0, 30), (-3.0, 40)], 0.5, 7);
        let changepoints = unwrap!(find_changepoints(
            &data,
            10,
            linear_kernel,
            20,
            &[8, 16],
            1.0,
            1.0
        ));
        assert_eq!(changepoints, vec![49, 79]);
    }

    #[test]
    fn test_mean_shift_gaussian_kernel() {
        let data = get_step_data(&[(0.0, 60), (4.0, 60)], 0.5, 11);
        let kernel = unwrap!(gaussian_kernel(1.0));
        let changepoints = unwrap!(find_changepoints(
            &data,
            10,
            &kernel,
            40,
            &[8, 16, 32],
            1.0,
            1.0
        ));
        assert_eq!(changepoints, vec![59]);
    }

    #[test]
    fn test_changepoint_count_bound() {
        let data = get_step_data(
            &[(0.0, 20), (5.0, 20), (0.0, 20), (5.0, 20), (0.0, 20)],
            0.2,
            3,
        );
        for max_changepoints in 0..6 {
            let changepoints = unwrap!(find_changepoints(
                &data,
                max_changepoints,
                linear_kernel,
                10,
                &[5, 10],
                0.0,
                0.0
            ));
            assert!(changepoints.len() <= max_changepoints);
            assert!(changepoints.windows(2).all(|w| w[0] < w[1]));
            assert!(changepoints.iter().all(|&x| x + 1 < data.len()));
        }
    }

    fn get_changepoint_count(data: &[f64], linear: f64, log_linear: f64) -> usize {
        unwrap!(find_changepoints(
            data,
            data.len(),
            linear_kernel,
            16,
            &[1, 2, 3],
            linear,
            log_linear
        ))
        .len()
    }

    #[test]
    fn test_penalty_monotonicity() {
        let data = get_step_data(
            &[(0.0, 30), (1.0, 30), (0.0, 30), (3.0, 30), (2.5, 30)],
            0.8,
            5,
        );
        let count = |linear: f64, log_linear: f64| {
            unwrap!(find_changepoints(
                &data,
                20,
                linear_kernel,
                20,
                &[4, 8, 16],
                linear,
                log_linear
            ))
            .len()
        };

        let penalties = [0.0, 1.0, 2.0, 5.0, 10.0, 50.0, 1000.0];
        for pair in penalties.windows(2) {
            assert!(count(pair[1], 1.0) <= count(pair[0], 1.0));
            assert!(count(1.0, pair[1]) <= count(1.0, pair[0]));
        }
    }

    #[test]
    fn test_penalty_monotonicity_with_changepoint_count_near_data_len() {
        let data = [3.0, 3.0, 12.0, 3.0, 9.0, 6.0, 12.0, 0.0];
        let low = get_changepoint_count(&data, 1.0, 5.0);
        let high = get_changepoint_count(&data, 1.0, 8.0);
        assert!(high <= low);
        assert!(low <= data.len());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        const PENALTIES: [f64; 5] = [0.0, 1.0, 2.0, 5.0, 10.0];

        proptest! {
            #[test]
            fn changepoint_count_nonincreasing_in_penalty(
                values in proptest::collection::vec(0u8..13, 2..13),
            ) {
                let data = values.iter().map(|&x| x as f64).collect::<Vec<_>>();
                for fixed in PENALTIES {
                    let mut last_linear = usize::MAX;
                    let mut last_log_linear = usize::MAX;
                    for penalty in PENALTIES {
                        let count = get_changepoint_count(&data, penalty, fixed);
                        prop_assert!(count <= data.len());
                        prop_assert!(count <= last_linear);
                        last_linear = count;

                        let count = get_changepoint_count(&data, fixed, penalty);
                        prop_assert!(count <= last_log_linear);
                        last_log_linear = count;
                    }
                }
            }
        }
    }

    #[test]
    fn test_determinism() {
        let data = get_step_data(&[(0.0, 200), (2.0, 150), (0.5, 150)], 1.0, 13);
        let kernel = unwrap!(gaussian_kernel(2.0));
        let settings = KernelSegmenterSettings {
            approximation_dimension: 30,
            seed: 99,
            ..Default::default()
        };
        let x = unwrap!(find_changepoints_with_settings(&data, &kernel, &settings));
        let y = unwrap!(find_changepoints_with_settings(&data, &kernel, &settings));
        assert_eq!(x, y);
    }

    #[test]
    fn test_changepoint_segments() {
        let segments = ChangepointSegments::new(&[], 3).collect::<Vec<_>>();
        assert_eq!(segments, vec![(0, 2)]);

        let segments = ChangepointSegments::new(&[0, 1], 3).collect::<Vec<_>>();
        assert_eq!(segments, vec![(0, 0), (1, 1), (2, 2)]);

        assert_eq!(ChangepointSegments::new(&[], 0).count(), 0);
    }
}
