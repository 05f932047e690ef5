//! Ordinary Least Squares (OLS) regression with coefficient standard errors.
//!
//! Used by the unit-root regressions of the stationarity tests. The caller supplies the
//! full design matrix row by row, including a constant column when an intercept is wanted.

use crate::error::{ForecastError, Result};

/// Fitted OLS regression.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Coefficients in design-matrix column order.
    pub coefficients: Vec<f64>,
    /// Standard error of each coefficient.
    pub std_errors: Vec<f64>,
    /// Sum of squared residuals.
    pub ssr: f64,
    /// Number of observations.
    pub nobs: usize,
}

impl OLSResult {
    /// Number of estimated coefficients.
    pub fn num_params(&self) -> usize {
        self.coefficients.len()
    }

    /// Residual degrees of freedom.
    pub fn df_resid(&self) -> usize {
        self.nobs - self.num_params()
    }

    /// t-ratio of coefficient `index`.
    pub fn t_stat(&self, index: usize) -> f64 {
        self.coefficients[index] / self.std_errors[index]
    }

    /// Gaussian log-likelihood at the least-squares estimate.
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0)
    }

    /// Akaike information criterion.
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.num_params() as f64
    }
}

/// Fit `y = X @ beta` by least squares.
///
/// Solves the normal equations with a Cholesky factorization and derives standard errors
/// from the diagonal of `(X'X)^-1`.
///
/// # Arguments
/// * `y` - Target values (length n)
/// * `design` - n rows of k regressors each
pub fn ols_fit(y: &[f64], design: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    if design.len() != n {
        return Err(ForecastError::DimensionMismatch {
            expected: n,
            got: design.len(),
        });
    }

    let k = design.first().map(|row| row.len()).unwrap_or(0);
    if k == 0 {
        return Err(ForecastError::InvalidParameter(
            "design matrix has no columns".into(),
        ));
    }
    if n <= k {
        return Err(ForecastError::InsufficientData {
            needed: k + 1,
            got: n,
        });
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &target) in design.iter().zip(y) {
        if row.len() != k {
            return Err(ForecastError::DimensionMismatch {
                expected: k,
                got: row.len(),
            });
        }
        for i in 0..k {
            xty[i] += row[i] * target;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
    }

    let chol = cholesky(&xtx).ok_or_else(|| {
        ForecastError::ComputationError("OLS design matrix is singular".into())
    })?;
    let coefficients = chol.solve(&xty);

    let ssr: f64 = design
        .iter()
        .zip(y)
        .map(|(row, &target)| {
            let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
            (target - fitted).powi(2)
        })
        .sum();
    let sigma2 = ssr / (n - k) as f64;

    let std_errors = (0..k)
        .map(|i| {
            let mut unit = vec![0.0; k];
            unit[i] = 1.0;
            (sigma2 * chol.solve(&unit)[i]).sqrt()
        })
        .collect();

    Ok(OLSResult {
        coefficients,
        std_errors,
        ssr,
        nobs: n,
    })
}

/// Lower-triangular Cholesky factor of a symmetric positive definite matrix.
struct Cholesky {
    lower: Vec<Vec<f64>>,
}

impl Cholesky {
    /// Solve `L L' x = b`.
    fn solve(&self, b: &[f64]) -> Vec<f64> {
        let l = &self.lower;
        let n = b.len();

        let mut y = vec![0.0; n];
        for i in 0..n {
            let sum: f64 = (0..i).map(|j| l[i][j] * y[j]).sum();
            y[i] = (b[i] - sum) / l[i][i];
        }

        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let sum: f64 = ((i + 1)..n).map(|j| l[j][i] * x[j]).sum();
            x[i] = (y[i] - sum) / l[i][i];
        }
        x
    }
}

/// Factor `a`, or `None` when a pivot is not clearly positive.
fn cholesky(a: &[Vec<f64>]) -> Option<Cholesky> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let sum = a[i][j] - (0..j).map(|m| l[i][m] * l[j][m]).sum::<f64>();
            if i == j {
                if sum <= 1e-12 * a[i][i].abs().max(f64::MIN_POSITIVE) {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(Cholesky { lower: l })
}
