//! Statistical utility functions.

use statrs::distribution::{ContinuousCDF, Normal};

fn standard_normal() -> Normal {
    // Constant, valid parameters.
    Normal::new(0.0, 1.0).unwrap()
}

/// Quantile function of the standard normal distribution.
///
/// # Example
/// ```
/// use traffic_forecast::utils::quantile_normal;
///
/// // 95% confidence level -> z ≈ 1.96
/// let z = quantile_normal(0.975);
/// assert!((z - 1.959964).abs() < 1e-5);
/// ```
pub fn quantile_normal(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }
    standard_normal().inverse_cdf(p)
}

/// Cumulative distribution function of the standard normal distribution.
pub fn normal_cdf(x: f64) -> f64 {
    standard_normal().cdf(x)
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Whether every value equals the first one up to a tolerance relative to its magnitude.
pub fn is_constant(values: &[f64]) -> bool {
    let Some(&first) = values.first() else {
        return true;
    };
    let tol = 1e-12 * first.abs().max(1.0);
    values.iter().all(|v| (v - first).abs() <= tol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn quantile_normal_known_values() {
        assert_relative_eq!(quantile_normal(0.5), 0.0, epsilon = 1e-9);
        assert_relative_eq!(quantile_normal(0.975), 1.959964, epsilon = 1e-5);
        assert_relative_eq!(quantile_normal(0.025), -1.959964, epsilon = 1e-5);
        assert_relative_eq!(quantile_normal(0.995), 2.575829, epsilon = 1e-5);
    }

    #[test]
    fn quantile_normal_boundary_values() {
        assert_eq!(quantile_normal(0.0), f64::NEG_INFINITY);
        assert_eq!(quantile_normal(1.0), f64::INFINITY);
    }

    #[test]
    fn normal_cdf_inverts_quantile() {
        for p in [0.01, 0.1, 0.5, 0.9, 0.99] {
            assert_relative_eq!(normal_cdf(quantile_normal(p)), p, epsilon = 1e-9);
        }
    }

    #[test]
    fn mean_of_slice() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn constant_detection() {
        assert!(is_constant(&[50.0; 10]));
        assert!(is_constant(&[]));
        assert!(!is_constant(&[10_000.0, 10_050.0]));
        assert!(is_constant(&[3_000_000.0, 3_000_000.0 + 1e-9]));
    }
}
