use crate::errors::{Result, bail_param};

/// Linear kernel over scalar data
///
/// Segmentation with this kernel detects changes in the mean.
///
pub fn linear_kernel(x: &f64, y: &f64) -> f64 {
    x * y
}

/// Gaussian kernel over scalar data, `exp(-(x-y)^2 / (2 * variance))`
///
/// Segmentation with this kernel detects changes in the full distribution, not just the mean.
///
pub fn gaussian_kernel(variance: f64) -> Result<impl Fn(&f64, &f64) -> f64 + Clone + Send + Sync> {
    if !(variance.is_finite() && variance > 0.0) {
        bail_param!("Gaussian kernel variance must be finite and > 0, found {variance}");
    }
    let scale = 1.0 / (2.0 * variance);
    Ok(move |x: &f64, y: &f64| (-(x - y) * (x - y) * scale).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use unwrap::unwrap;

    #[test]
    fn test_linear_kernel() {
        approx::assert_ulps_eq!(linear_kernel(&2.0, &-3.5), -7.0, max_ulps = 4);
    }

    #[test]
    fn test_gaussian_kernel() {
        let kernel = unwrap!(gaussian_kernel(0.5));
        approx::assert_ulps_eq!(kernel(&1.0, &1.0), 1.0, max_ulps = 4);
        approx::assert_ulps_eq!(kernel(&1.0, &2.0), (-1.0f64).exp(), max_ulps = 4);
        approx::assert_ulps_eq!(kernel(&2.0, &1.0), kernel(&1.0, &2.0), max_ulps = 4);

        assert!(gaussian_kernel(0.0).is_err());
        assert!(gaussian_kernel(-1.0).is_err());
        assert!(gaussian_kernel(f64::NAN).is_err());
    }
}
