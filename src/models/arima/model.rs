//! ARIMA (Autoregressive Integrated Moving Average) model.

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, integrate};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{is_constant, quantile_normal};
use crate::validation::{jarque_bera, ljung_box};
use chrono::NaiveDate;
use std::fmt::Write as _;
use tracing::{debug, warn};

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    /// Create a new ARIMA specification.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Number of mean-equation parameters (AR + MA + intercept).
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }

    /// Shortest series that leaves at least two residual degrees of freedom.
    pub fn min_observations(&self) -> usize {
        self.d + self.p.max(self.q) + self.num_params() + 1
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl std::fmt::Display for ARIMASpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ARIMA({}, {}, {})", self.p, self.d, self.q)
    }
}

/// ARIMA forecasting model.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): autoregression on the differenced series (around its mean)
/// - I(d): differencing for stationarity
/// - MA(q): moving average of past one-step errors
///
/// Parameters are estimated by conditional sum of squares. With `d = 1` the intercept is
/// the drift per period.
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Mean of the differenced series.
    intercept: f64,
    original: Option<Vec<f64>>,
    differenced: Option<Vec<f64>>,
    /// Fitted values on the differenced scale.
    fitted_diff: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    sigma2: Option<f64>,
    log_likelihood: Option<f64>,
    aic: Option<f64>,
    bic: Option<f64>,
    /// Length of the undifferenced input.
    n: usize,
    sample: Option<(NaiveDate, NaiveDate)>,
    iterations: usize,
}

impl ARIMA {
    /// Create a new ARIMA model.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_spec(ARIMASpec::new(p, d, q))
    }

    pub fn from_spec(spec: ARIMASpec) -> Self {
        Self {
            spec,
            ar_coefficients: vec![],
            ma_coefficients: vec![],
            intercept: 0.0,
            original: None,
            differenced: None,
            fitted_diff: None,
            residuals: None,
            sigma2: None,
            log_likelihood: None,
            aic: None,
            bic: None,
            n: 0,
            sample: None,
            iterations: 0,
        }
    }

    /// Create an ARIMA(1,1,1) model.
    pub fn arima_111() -> Self {
        Self::new(1, 1, 1)
    }

    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Residual variance.
    pub fn sigma2(&self) -> Option<f64> {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> Option<f64> {
        self.log_likelihood
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    pub fn bic(&self) -> Option<f64> {
        self.bic
    }

    /// Number of observations in the undifferenced input (0 before fitting).
    pub fn nobs(&self) -> usize {
        self.n
    }

    /// First and last observation dates of the fitted sample.
    pub fn sample(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.sample
    }

    /// Optimizer iterations used by the last fit.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Conditional sum of squares for the given parameters.
    fn calculate_css(
        diff_series: &[f64],
        p: usize,
        q: usize,
        ar: &[f64],
        ma: &[f64],
        intercept: f64,
    ) -> f64 {
        let n = diff_series.len();
        let start = p.max(q);

        if n <= start {
            return f64::MAX;
        }

        let mut residuals = vec![0.0; n];
        let mut css = 0.0;

        for t in start..n {
            let mut pred = intercept;
            for i in 0..p {
                pred += ar[i] * (diff_series[t - 1 - i] - intercept);
            }
            for i in 0..q {
                pred += ma[i] * residuals[t - 1 - i];
            }

            let error = diff_series[t] - pred;
            residuals[t] = error;
            css += error * error;
        }

        css
    }

    /// Estimate parameters by minimizing the conditional sum of squares.
    ///
    /// The series is divided by its root mean square first so the optimizer works on
    /// unit scale regardless of the magnitude of the counts.
    fn estimate_parameters(&mut self, diff_series: &[f64]) -> Result<()> {
        let p = self.spec.p;
        let q = self.spec.q;

        let rms = (diff_series.iter().map(|x| x * x).sum::<f64>() / diff_series.len() as f64)
            .sqrt();
        let scale = if rms > 0.0 { rms } else { 1.0 };
        let scaled: Vec<f64> = diff_series.iter().map(|x| x / scale).collect();
        let mean = scaled.iter().sum::<f64>() / scaled.len() as f64;

        if p == 0 && q == 0 {
            self.intercept = mean * scale;
            self.ar_coefficients = vec![];
            self.ma_coefficients = vec![];
            self.iterations = 0;
            return Ok(());
        }

        let mut initial = vec![0.0; p + q + 1];
        initial[0] = mean;
        for i in 0..p {
            initial[1 + i] = 0.1 / (i + 1) as f64;
        }
        for i in 0..q {
            initial[1 + p + i] = 0.1 / (i + 1) as f64;
        }

        // Keep AR stationary and MA invertible.
        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-0.99, 0.99)).take(p + q));

        let result = nelder_mead(
            |params| {
                Self::calculate_css(
                    &scaled,
                    p,
                    q,
                    &params[1..1 + p],
                    &params[1 + p..],
                    params[0],
                )
            },
            &initial,
            Some(bounds.as_slice()),
            NelderMeadConfig::default(),
        );

        self.iterations = result.iterations;
        if !result.converged {
            warn!(
                iterations = result.iterations,
                objective = result.optimal_value,
                "CSS optimizer did not converge"
            );
            return Err(ForecastError::ModelFit(format!(
                "optimizer did not converge after {} iterations (CSS = {:.6e})",
                result.iterations,
                result.optimal_value * scale * scale
            )));
        }
        if !result.optimal_value.is_finite()
            || result.optimal_point.iter().any(|x| !x.is_finite())
        {
            return Err(ForecastError::ModelFit(
                "optimizer returned non-finite parameters".into(),
            ));
        }

        self.intercept = result.optimal_point[0] * scale;
        self.ar_coefficients = result.optimal_point[1..1 + p].to_vec();
        self.ma_coefficients = result.optimal_point[1 + p..].to_vec();
        Ok(())
    }

    /// Calculate fitted values, residuals and information criteria.
    fn calculate_fitted(&mut self, diff_series: &[f64]) {
        let n = diff_series.len();
        let p = self.spec.p;
        let q = self.spec.q;
        let start = p.max(q);

        let mut fitted = vec![f64::NAN; n];
        let mut residuals = vec![0.0; n];

        for t in start..n {
            let mut pred = self.intercept;
            for i in 0..p {
                pred += self.ar_coefficients[i] * (diff_series[t - 1 - i] - self.intercept);
            }
            for i in 0..q {
                pred += self.ma_coefficients[i] * residuals[t - 1 - i];
            }

            fitted[t] = pred;
            residuals[t] = diff_series[t] - pred;
        }

        let effective = &residuals[start..];
        let n_eff = effective.len() as f64;
        let mean_square = diff_series.iter().map(|x| x * x).sum::<f64>() / n as f64;
        // An exact fit would give log(0); floor at rounding level of the data.
        let floor = f64::EPSILON * mean_square.max(1.0);
        let sigma2 = (effective.iter().map(|r| r * r).sum::<f64>() / n_eff).max(floor);

        // Mean parameters plus the innovation variance.
        let k = (self.spec.num_params() + 1) as f64;
        let ll = -0.5 * n_eff * ((2.0 * std::f64::consts::PI).ln() + sigma2.ln() + 1.0);

        self.sigma2 = Some(sigma2);
        self.log_likelihood = Some(ll);
        self.aic = Some(-2.0 * ll + 2.0 * k);
        self.bic = Some(-2.0 * ll + k * n_eff.ln());
        self.fitted_diff = Some(fitted);
        self.residuals = Some(residuals);
    }

    /// MA(infinity) weights of the integrated model `phi(B) (1-B)^d y_t = theta(B) e_t`.
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        // Coefficients of phi(B) (1 - B)^d as a polynomial in B.
        let mut poly = vec![1.0];
        poly.extend(self.ar_coefficients.iter().map(|a| -a));
        for _ in 0..self.spec.d {
            let mut next = vec![0.0; poly.len() + 1];
            for (i, c) in poly.iter().enumerate() {
                next[i] += c;
                next[i + 1] -= c;
            }
            poly = next;
        }
        let phi: Vec<f64> = poly[1..].iter().map(|c| -c).collect();

        let mut psi = vec![0.0; horizon];
        if horizon == 0 {
            return psi;
        }
        psi[0] = 1.0;
        for j in 1..horizon {
            let theta = self.ma_coefficients.get(j - 1).copied().unwrap_or(0.0);
            let ar_part: f64 = phi
                .iter()
                .take(j)
                .enumerate()
                .map(|(i, f)| f * psi[j - 1 - i])
                .sum();
            psi[j] = theta + ar_part;
        }
        psi
    }

    /// Plain-text estimation report.
    pub fn summary(&self) -> Result<String> {
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;
        let sigma2 = self.sigma2.ok_or(ForecastError::FitRequired)?;
        let effective = &residuals[self.spec.p.max(self.spec.q)..];
        let lb = ljung_box(effective, 1);
        let jb = jarque_bera(effective);

        let rule = "=".repeat(66);
        let thin = "-".repeat(66);
        let sample = match self.sample {
            Some((start, end)) => format!("{} - {}", start.format("%Y-%m"), end.format("%Y-%m")),
            None => "n/a".to_string(),
        };

        let drift_label = if self.spec.d > 0 { "drift" } else { "const" };

        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{:^66}", "ARIMA Results");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "{:<7}{:>25}   {:<18}{:>13}",
            "Model:",
            format!("{} with {drift_label}", self.spec),
            "No. Observations:",
            self.n
        );
        let _ = writeln!(
            out,
            "{:<16}{:>16}   {:<18}{:>13.3}",
            "Method:",
            "css",
            "Log Likelihood",
            self.log_likelihood.unwrap_or(f64::NAN)
        );
        let _ = writeln!(
            out,
            "{:<16}{:>16}   {:<18}{:>13.3}",
            "Sample:",
            sample,
            "AIC",
            self.aic.unwrap_or(f64::NAN)
        );
        let _ = writeln!(
            out,
            "{:<16}{:>16}   {:<18}{:>13.3}",
            "Iterations:",
            self.iterations,
            "BIC",
            self.bic.unwrap_or(f64::NAN)
        );
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{:<16}{:>16}", "", "coef");
        let _ = writeln!(out, "{thin}");
        let _ = writeln!(out, "{:<16}{:>16.4}", drift_label, self.intercept);
        for (i, a) in self.ar_coefficients.iter().enumerate() {
            let _ = writeln!(out, "{:<16}{:>16.4}", format!("ar.L{}", i + 1), a);
        }
        for (i, m) in self.ma_coefficients.iter().enumerate() {
            let _ = writeln!(out, "{:<16}{:>16.4}", format!("ma.L{}", i + 1), m);
        }
        let _ = writeln!(out, "{:<16}{:>16.4e}", "sigma2", sigma2);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "{:<22}{:>10.2}   {:<18}{:>13.2}",
            "Ljung-Box (L1) (Q):",
            lb.statistic,
            "Jarque-Bera (JB):",
            jb.statistic
        );
        let _ = writeln!(
            out,
            "{:<22}{:>10.2}   {:<18}{:>13.2}",
            "Prob(Q):",
            lb.p_value,
            "Prob(JB):",
            jb.p_value
        );
        let _ = write!(out, "{rule}");
        Ok(out)
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::arima_111()
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.values();
        let min_len = self.spec.min_observations();

        if values.len() < min_len {
            return Err(ForecastError::InsufficientData {
                needed: min_len,
                got: values.len(),
            });
        }
        if is_constant(values) {
            return Err(ForecastError::ModelFit(
                "series has zero variance".into(),
            ));
        }

        let diff_series = difference(values, self.spec.d);
        self.estimate_parameters(&diff_series)?;
        self.calculate_fitted(&diff_series);

        self.n = values.len();
        self.original = Some(values.to_vec());
        self.differenced = Some(diff_series);
        self.sample = series.timestamps().first().copied().zip(series.last_timestamp());

        debug!(
            spec = %self.spec,
            intercept = self.intercept,
            ar = ?self.ar_coefficients,
            ma = ?self.ma_coefficients,
            aic = self.aic,
            iterations = self.iterations,
            "ARIMA fitted"
        );
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let diff_series = self
            .differenced
            .as_ref()
            .ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let p = self.spec.p;
        let q = self.spec.q;

        let mut extended_diff = diff_series.clone();
        let mut extended_residuals = residuals.clone();

        for _ in 0..horizon {
            let t = extended_diff.len();
            let mut pred = self.intercept;

            for i in 0..p {
                if t > i {
                    pred += self.ar_coefficients[i] * (extended_diff[t - 1 - i] - self.intercept);
                }
            }
            // Future shocks have expectation zero.
            for i in 0..q {
                if t > i {
                    pred += self.ma_coefficients[i] * extended_residuals[t - 1 - i];
                }
            }

            extended_diff.push(pred);
            extended_residuals.push(0.0);
        }

        let forecast_diff = &extended_diff[diff_series.len()..];
        let predictions = integrate(forecast_diff, original, self.spec.d);

        Ok(Forecast::from_values(predictions))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must lie in (0, 1), got {level}"
            )));
        }
        let forecast = self.predict(horizon)?;
        let sigma2 = self.sigma2.ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(forecast);
        }

        let z = quantile_normal((1.0 + level) / 2.0);
        let preds = forecast.primary();

        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (pred, psi) in preds.iter().zip(self.psi_weights(horizon)) {
            cumulative += psi * psi;
            let se = (sigma2 * cumulative).sqrt();
            lower.push(pred - z * se);
            upper.push(pred + z * se);
        }

        Ok(Forecast::from_values_with_intervals(
            preds.to_vec(),
            lower,
            upper,
        ))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted_diff.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}
