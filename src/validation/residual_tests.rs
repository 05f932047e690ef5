//! Residual diagnostics reported in the model summary.

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Ljung-Box portmanteau test result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LjungBoxResult {
    /// Test statistic Q
    pub statistic: f64,
    pub p_value: f64,
    /// Number of autocorrelation lags in Q
    pub lags: usize,
}

/// Jarque-Bera normality test result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JarqueBeraResult {
    pub statistic: f64,
    pub p_value: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

/// Ljung-Box test for autocorrelation up to `lags`.
///
/// Null hypothesis: the residuals are independently distributed. A zero-variance input
/// has no autocorrelation and yields `Q = 0`, `p = 1`.
pub fn ljung_box(residuals: &[f64], lags: usize) -> LjungBoxResult {
    let n = residuals.len();
    let lags = lags.min(n.saturating_sub(1));
    if lags == 0 {
        return LjungBoxResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags,
        };
    }

    let mean = residuals.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = residuals.iter().map(|r| r - mean).collect();
    let denom: f64 = centered.iter().map(|c| c * c).sum();
    if denom == 0.0 {
        return LjungBoxResult {
            statistic: 0.0,
            p_value: 1.0,
            lags,
        };
    }

    let q = (1..=lags)
        .map(|k| {
            let acf: f64 = centered[k..]
                .iter()
                .zip(&centered)
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / denom;
            acf * acf / (n - k) as f64
        })
        .sum::<f64>()
        * (n * (n + 2)) as f64;

    LjungBoxResult {
        statistic: q,
        p_value: chi_squared_sf(q, lags as f64),
        lags,
    }
}

/// Jarque-Bera test based on sample skewness and kurtosis.
pub fn jarque_bera(residuals: &[f64]) -> JarqueBeraResult {
    let n = residuals.len() as f64;
    let mean = residuals.iter().sum::<f64>() / n;
    let m2 = residuals.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    if residuals.len() < 3 || m2 == 0.0 {
        return JarqueBeraResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            skewness: f64::NAN,
            kurtosis: f64::NAN,
        };
    }
    let m3 = residuals.iter().map(|r| (r - mean).powi(3)).sum::<f64>() / n;
    let m4 = residuals.iter().map(|r| (r - mean).powi(4)).sum::<f64>() / n;

    let skewness = m3 / m2.powf(1.5);
    let kurtosis = m4 / (m2 * m2);
    let statistic = n / 6.0 * (skewness * skewness + (kurtosis - 3.0).powi(2) / 4.0);

    JarqueBeraResult {
        statistic,
        p_value: chi_squared_sf(statistic, 2.0),
        skewness,
        kurtosis,
    }
}

fn chi_squared_sf(x: f64, df: f64) -> f64 {
    match ChiSquared::new(df) {
        Ok(dist) => 1.0 - dist.cdf(x),
        Err(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ljung_box_flags_autocorrelation() {
        // Slow sine: strongly autocorrelated.
        let residuals: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).sin()).collect();
        let result = ljung_box(&residuals, 10);
        assert!(result.statistic > 100.0);
        assert!(result.p_value < 0.001);
    }

    #[test]
    fn ljung_box_constant_residuals() {
        let result = ljung_box(&[0.0; 20], 1);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn ljung_box_too_short() {
        let result = ljung_box(&[1.0], 1);
        assert!(result.statistic.is_nan());
        assert_eq!(result.lags, 0);
    }

    #[test]
    fn jarque_bera_symmetric_sample() {
        let residuals = [-2.0, -1.0, 0.0, 1.0, 2.0, -2.0, -1.0, 0.0, 1.0, 2.0];
        let result = jarque_bera(&residuals);
        assert_relative_eq!(result.skewness, 0.0, epsilon = 1e-12);
        assert!(result.p_value > 0.05);
    }

    #[test]
    fn jarque_bera_degenerate() {
        assert!(jarque_bera(&[3.0; 10]).statistic.is_nan());
    }
}
