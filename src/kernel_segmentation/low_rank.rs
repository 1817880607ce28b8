//! Low-rank kernel feature approximation from a data subsample
//!
//! Each data point is mapped to a short feature vector `z_i` such that `z_i . z_j` approximates
//! `k(x_i, x_j)`. The map is built from the Gram matrix of a subsample of the data, so the cost of
//! building it is bounded by the subsample size instead of the full data length.
//!

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Eigenvalues below this fraction of the largest eigenvalue are treated as numerically zero
const RELATIVE_EIGENVALUE_TOLERANCE: f64 = 1e-10;

const MAX_JACOBI_SWEEPS: usize = 100;

/// Dense row-major feature matrix, one row per data point
///
pub(super) struct KernelFeatures {
    pub dimension: usize,
    pub values: Vec<f64>,
}

impl KernelFeatures {
    pub(super) fn row(&self, index: usize) -> &[f64] {
        &self.values[index * self.dimension..(index + 1) * self.dimension]
    }
}

/// Select the data indices used to build the approximation
///
/// All indices are used when the data is not longer than the requested dimension, otherwise a
/// seeded sample without replacement is drawn. Returned indices are sorted.
///
pub(super) fn get_subsample_indices(
    data_len: usize,
    approximation_dimension: usize,
    seed: u64,
) -> Vec<usize> {
    if data_len <= approximation_dimension {
        return (0..data_len).collect();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices =
        rand::seq::index::sample(&mut rng, data_len, approximation_dimension).into_vec();
    indices.sort_unstable();
    indices
}

/// Eigendecomposition of a symmetric row-major matrix by cyclic Jacobi rotations
///
/// Returns the eigenvalues and a row-major matrix with the matching eigenvectors in its columns.
///
fn symmetric_eigen(mut a: Vec<f64>, n: usize) -> (Vec<f64>, Vec<f64>) {
    assert_eq!(a.len(), n * n);

    let mut v = vec![0.0; n * n];
    for i in 0..n {
        v[i * n + i] = 1.0;
    }

    let total_norm: f64 = a.iter().map(|x| x * x).sum();

    for _ in 0..MAX_JACOBI_SWEEPS {
        let mut off_norm = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off_norm += 2.0 * a[p * n + q] * a[p * n + q];
            }
        }
        if off_norm <= f64::EPSILON * f64::EPSILON * total_norm {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                let app = a[p * n + p];
                let aqq = a[q * n + q];

                // Drop elements too small to change either diagonal value
                let g = 100.0 * apq.abs();
                if app.abs() + g == app.abs() && aqq.abs() + g == aqq.abs() {
                    a[p * n + q] = 0.0;
                    a[q * n + p] = 0.0;
                    continue;
                }
                let theta = (aqq - app) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k * n + p];
                    let akq = a[k * n + q];
                    a[k * n + p] = c * akp - s * akq;
                    a[k * n + q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p * n + k];
                    let aqk = a[q * n + k];
                    a[p * n + k] = c * apk - s * aqk;
                    a[q * n + k] = s * apk + c * aqk;
                }
                a[p * n + q] = 0.0;
                a[q * n + p] = 0.0;

                for k in 0..n {
                    let vkp = v[k * n + p];
                    let vkq = v[k * n + q];
                    v[k * n + p] = c * vkp - s * vkq;
                    v[k * n + q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i * n + i]).collect();
    (eigenvalues, v)
}

/// Build the Nyström feature map for all data points
///
/// With subsample `S`, Gram matrix `W = U Λ Uᵀ` over `S`, each point is mapped to
/// `z_i = Λ^{-1/2} Uᵀ [k(x_i, x_s) for s in S]`. Numerically zero eigenvalues are dropped, so the
/// feature dimension can be smaller than the subsample size.
///
pub(super) fn get_kernel_features<T, K>(
    data: &[T],
    kernel: &K,
    approximation_dimension: usize,
    seed: u64,
) -> KernelFeatures
where
    K: Fn(&T, &T) -> f64,
{
    let subsample = get_subsample_indices(data.len(), approximation_dimension, seed);
    let sub_count = subsample.len();

    let mut gram = vec![0.0; sub_count * sub_count];
    for (a, &ia) in subsample.iter().enumerate() {
        for (b, &ib) in subsample.iter().enumerate().skip(a) {
            let value = kernel(&data[ia], &data[ib]);
            gram[a * sub_count + b] = value;
            gram[b * sub_count + a] = value;
        }
    }

    let (eigenvalues, eigenvectors) = symmetric_eigen(gram, sub_count);

    let max_eigenvalue = eigenvalues.iter().copied().fold(0.0, f64::max);
    let components = eigenvalues
        .iter()
        .enumerate()
        .filter(|(_, x)| **x > 0.0 && **x > max_eigenvalue * RELATIVE_EIGENVALUE_TOLERANCE)
        .map(|(i, x)| (i, 1.0 / x.sqrt()))
        .collect::<Vec<_>>();
    let dimension = components.len();

    debug!(
        "Kernel approximation from {sub_count} subsampled points retained {dimension} components"
    );

    let mut values = vec![0.0; data.len() * dimension];
    let mut cross = vec![0.0; sub_count];
    for (i, x) in data.iter().enumerate() {
        for (c, &s) in cross.iter_mut().zip(subsample.iter()) {
            *c = kernel(x, &data[s]);
        }
        let row = &mut values[i * dimension..(i + 1) * dimension];
        for (z, &(component, scale)) in row.iter_mut().zip(components.iter()) {
            let projection: f64 = cross
                .iter()
                .enumerate()
                .map(|(a, c)| eigenvectors[a * sub_count + component] * c)
                .sum();
            *z = projection * scale;
        }
    }

    KernelFeatures { dimension, values }
}
