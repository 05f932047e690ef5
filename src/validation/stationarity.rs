//! Unit-root and stationarity tests.
//!
//! The Augmented Dickey-Fuller test (null: unit root) and the KPSS test (null: level
//! stationarity) are complementary and are reported side by side. Neither result is
//! turned into a verdict here; reading the pair is left to the caller.

use crate::error::{ForecastError, Result};
use crate::utils::ols::{ols_fit, OLSResult};
use crate::utils::stats::{is_constant, mean, normal_cdf};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Serialize as DeriveSerialize;
use tracing::{debug, warn};

/// Smallest series either test accepts.
pub const MIN_STATIONARITY_OBS: usize = 12;

/// Which hypothesis test produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeriveSerialize)]
pub enum StationarityTest {
    #[serde(rename = "adf")]
    AugmentedDickeyFuller,
    #[serde(rename = "kpss")]
    Kpss,
}

impl StationarityTest {
    pub fn name(&self) -> &'static str {
        match self {
            StationarityTest::AugmentedDickeyFuller => "Augmented Dickey-Fuller",
            StationarityTest::Kpss => "KPSS",
        }
    }
}

/// Critical values keyed by significance label, in the order the test tabulates them.
///
/// Serializes as a JSON object such as `{"1%": -3.58, "5%": -2.93, "10%": -2.60}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriticalValues {
    entries: Vec<(&'static str, f64)>,
}

impl CriticalValues {
    fn new(entries: Vec<(&'static str, f64)>) -> Self {
        Self { entries }
    }

    /// Threshold for a label such as `"5%"`.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|&(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CriticalValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Outcome of a single stationarity test.
#[derive(Debug, Clone, PartialEq, DeriveSerialize)]
pub struct StationarityResult {
    pub test: StationarityTest,
    /// Test statistic; limiting values serialize as `"-inf"` or `"inf"`.
    #[serde(serialize_with = "serialize_statistic")]
    pub statistic: f64,
    /// P-value in `[0, 1]`.
    pub p_value: f64,
    /// Lag order used (augmentation lags for ADF, bandwidth for KPSS).
    pub lags: usize,
    /// Observations in the test regression.
    pub nobs: usize,
    pub critical_values: CriticalValues,
}

fn serialize_statistic<S: Serializer>(
    value: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("nan")
    } else if *value > 0.0 {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

/// ADF and KPSS results for the same series.
#[derive(Debug, Clone, PartialEq, DeriveSerialize)]
pub struct StationarityReport {
    pub adf: StationarityResult,
    pub kpss: StationarityResult,
}

/// Run both tests with their default lag selection.
pub fn test_stationarity(series: &[f64]) -> Result<StationarityReport> {
    Ok(StationarityReport {
        adf: adf_test(series, None)?,
        kpss: kpss_test(series, None)?,
    })
}

fn ensure_min_len(series: &[f64]) -> Result<()> {
    if series.len() < MIN_STATIONARITY_OBS {
        return Err(ForecastError::InsufficientData {
            needed: MIN_STATIONARITY_OBS,
            got: series.len(),
        });
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::MissingValues);
    }
    Ok(())
}

// ==================== Augmented Dickey-Fuller ====================

/// MacKinnon (2010) response-surface coefficients for the constant-only regression:
/// `cv = b0 + b1/n + b2/n^2 + b3/n^3`.
const ADF_CRITICAL_SURFACE: [(&str, [f64; 4]); 3] = [
    ("1%", [-3.43035, -6.5393, -16.786, -79.433]),
    ("5%", [-2.86154, -2.8903, -4.234, -40.040]),
    ("10%", [-2.56677, -1.5384, -2.809, 0.0]),
];

/// MacKinnon (1994) p-value polynomials, constant-only regression, one variable.
const ADF_TAU_MAX: f64 = 2.74;
const ADF_TAU_MIN: f64 = -18.83;
const ADF_TAU_STAR: f64 = -1.61;
const ADF_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const ADF_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

/// Augmented Dickey-Fuller test with a constant.
///
/// Regresses `dy_t` on `[1, y_{t-1}, dy_{t-1}, .., dy_{t-k}]` and reports the t-ratio of
/// the `y_{t-1}` coefficient. The augmentation order `k` is chosen by minimum AIC over
/// `0..=max_lags` on a common sample, then the regression is re-estimated on every
/// available observation. Regressions without residual variance give a limiting
/// statistic instead of an error.
///
/// # Arguments
/// * `series` - Observations, at least [`MIN_STATIONARITY_OBS`]
/// * `max_lags` - Upper bound for the lag search (default: `ceil(12 * (n/100)^(1/4))`)
pub fn adf_test(series: &[f64], max_lags: Option<usize>) -> Result<StationarityResult> {
    ensure_min_len(series)?;
    let n = series.len();

    // Largest order that leaves a regression with positive residual degrees of freedom.
    let cap = n / 2 - 2;
    let default_lags = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    let max_lags = max_lags.unwrap_or(default_lags).min(cap);

    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    if is_constant(series) {
        warn!(n, "ADF input has zero variance; reporting it as trivially stationary");
        let nobs = diff.len();
        return Ok(StationarityResult {
            test: StationarityTest::AugmentedDickeyFuller,
            statistic: f64::NEG_INFINITY,
            p_value: 0.0,
            lags: 0,
            nobs,
            critical_values: adf_critical_values(nobs),
        });
    }

    // Regressions that fit the increments exactly carry no test information.
    let scale: f64 = diff.iter().map(|d| d * d).sum();
    let is_exact = |fit: &OLSResult| fit.ssr <= 1e-14 * scale;

    let mut best: Option<(usize, f64)> = None;
    for lag in 0..=max_lags {
        let Ok(fit) = adf_regression(series, &diff, lag, max_lags) else {
            continue;
        };
        let aic = fit.aic();
        if !is_exact(&fit) && aic.is_finite() && best.map_or(true, |(_, b)| aic < b) {
            best = Some((lag, aic));
        }
    }
    let Some((lag, _)) = best else {
        let fit = adf_regression(series, &diff, 0, 0)?;
        return Ok(exact_fit_result(&fit, 0));
    };

    let fit = adf_regression(series, &diff, lag, lag)?;
    let statistic = fit.t_stat(1);
    if is_exact(&fit) || !statistic.is_finite() {
        return Ok(exact_fit_result(&fit, lag));
    }

    let result = StationarityResult {
        test: StationarityTest::AugmentedDickeyFuller,
        statistic,
        p_value: adf_p_value(statistic),
        lags: lag,
        nobs: fit.nobs,
        critical_values: adf_critical_values(fit.nobs),
    };
    debug!(
        statistic = result.statistic,
        p_value = result.p_value,
        lags = result.lags,
        "ADF test complete"
    );
    Ok(result)
}

/// Limiting ADF outcome when the regression leaves no residual variance.
///
/// The `y_{t-1}` coefficient is then known without error: a negative value is an
/// infinitely strong rejection, zero (deterministic growth) is a unit root.
fn exact_fit_result(fit: &OLSResult, lags: usize) -> StationarityResult {
    let gamma = fit.coefficients[1];
    let (statistic, p_value) = if gamma < -1e-8 {
        (f64::NEG_INFINITY, 0.0)
    } else if gamma > 1e-8 {
        (f64::INFINITY, 1.0)
    } else {
        (0.0, adf_p_value(0.0))
    };
    warn!(
        gamma,
        statistic, "ADF regression fits the increments exactly; reporting limiting statistic"
    );
    StationarityResult {
        test: StationarityTest::AugmentedDickeyFuller,
        statistic,
        p_value,
        lags,
        nobs: fit.nobs,
        critical_values: adf_critical_values(fit.nobs),
    }
}

/// ADF regression with `lag` augmentation terms, using rows from `start` on.
///
/// Row `t` (indexing `diff`) has target `diff[t]` and regressors
/// `[1, series[t], diff[t-1], .., diff[t-lag]]`.
fn adf_regression(series: &[f64], diff: &[f64], lag: usize, start: usize) -> Result<OLSResult> {
    let rows = start..diff.len();
    let y: Vec<f64> = diff[rows.clone()].to_vec();
    let design: Vec<Vec<f64>> = rows
        .map(|t| {
            let mut row = Vec::with_capacity(lag + 2);
            row.push(1.0);
            row.push(series[t]);
            row.extend((1..=lag).map(|i| diff[t - i]));
            row
        })
        .collect();
    ols_fit(&y, &design)
}

fn adf_critical_values(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs as f64;
    CriticalValues::new(
        ADF_CRITICAL_SURFACE
            .iter()
            .map(|&(label, b)| (label, b[0] + inv * (b[1] + inv * (b[2] + inv * b[3]))))
            .collect(),
    )
}

/// MacKinnon approximate p-value for the constant-only ADF statistic.
fn adf_p_value(statistic: f64) -> f64 {
    if statistic > ADF_TAU_MAX {
        return 1.0;
    }
    if statistic < ADF_TAU_MIN {
        return 0.0;
    }
    let coefs: &[f64] = if statistic <= ADF_TAU_STAR {
        &ADF_SMALL_P
    } else {
        &ADF_LARGE_P
    };
    let z = coefs
        .iter()
        .rev()
        .fold(0.0, |acc, &c| acc * statistic + c);
    normal_cdf(z)
}

// ==================== KPSS ====================

/// Kwiatkowski et al. (1992) table for level stationarity.
const KPSS_CRITICAL: [(&str, f64, f64); 4] = [
    ("10%", 0.347, 0.10),
    ("5%", 0.463, 0.05),
    ("2.5%", 0.574, 0.025),
    ("1%", 0.739, 0.01),
];

/// KPSS test for level stationarity.
///
/// The statistic is `sum(S_t^2) / (n^2 * s^2)` where `S_t` are partial sums of the
/// demeaned series and `s^2` is the Bartlett-kernel long-run variance. The p-value is
/// interpolated in the tabulated critical values and therefore lies in `[0.01, 0.10]`.
///
/// # Arguments
/// * `series` - Observations, at least [`MIN_STATIONARITY_OBS`]
/// * `lags` - Bartlett bandwidth (default: Hobijn et al. data-dependent choice)
pub fn kpss_test(series: &[f64], lags: Option<usize>) -> Result<StationarityResult> {
    ensure_min_len(series)?;
    let n = series.len();
    let critical_values =
        CriticalValues::new(KPSS_CRITICAL.iter().map(|&(l, cv, _)| (l, cv)).collect());

    if is_constant(series) {
        warn!(n, "KPSS input has zero variance; reporting it as stationary");
        return Ok(StationarityResult {
            test: StationarityTest::Kpss,
            statistic: 0.0,
            p_value: KPSS_CRITICAL[0].2,
            lags: 0,
            nobs: n,
            critical_values,
        });
    }

    let m = mean(series);
    let resid: Vec<f64> = series.iter().map(|x| x - m).collect();
    let lags = lags
        .unwrap_or_else(|| kpss_auto_lags(&resid))
        .min(n - 1);

    let mut partial = 0.0;
    let eta = resid
        .iter()
        .map(|r| {
            partial += r;
            partial * partial
        })
        .sum::<f64>()
        / (n * n) as f64;

    let long_run = bartlett_variance(&resid, lags);
    let statistic = if long_run > 0.0 {
        eta / long_run
    } else {
        warn!(lags, "KPSS long-run variance vanished; reporting limiting statistic");
        f64::INFINITY
    };
    let result = StationarityResult {
        test: StationarityTest::Kpss,
        statistic,
        p_value: kpss_p_value(statistic),
        lags,
        nobs: n,
        critical_values,
    };
    debug!(
        statistic = result.statistic,
        p_value = result.p_value,
        lags = result.lags,
        "KPSS test complete"
    );
    Ok(result)
}

/// Lag-`k` autocovariance sum `sum_t r_t r_{t-k}` (not normalized).
fn cross_product(resid: &[f64], k: usize) -> f64 {
    resid[k..]
        .iter()
        .zip(resid.iter())
        .map(|(a, b)| a * b)
        .sum()
}

/// Newey-West long-run variance with Bartlett weights `1 - j/(lags+1)`.
fn bartlett_variance(resid: &[f64], lags: usize) -> f64 {
    let n = resid.len();
    let mut s = cross_product(resid, 0);
    for j in 1..=lags.min(n - 1) {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        s += 2.0 * weight * cross_product(resid, j);
    }
    s / n as f64
}

/// Hobijn, Franses and Ooms (1998) automatic bandwidth.
fn kpss_auto_lags(resid: &[f64]) -> usize {
    let n = resid.len();
    let cov_lags = (n as f64).powf(2.0 / 9.0) as usize;

    let mut s0 = cross_product(resid, 0) / n as f64;
    let mut s1 = 0.0;
    for i in 1..=cov_lags.min(n - 1) {
        let prod = cross_product(resid, i) / (n as f64 / 2.0);
        s0 += prod;
        s1 += i as f64 * prod;
    }
    if s0 == 0.0 {
        return 0;
    }

    let s_hat = s1 / s0;
    let gamma = 1.1447 * (s_hat * s_hat).powf(1.0 / 3.0);
    (gamma * (n as f64).powf(1.0 / 3.0)) as usize
}

fn kpss_p_value(statistic: f64) -> f64 {
    let (first, last) = (KPSS_CRITICAL[0], KPSS_CRITICAL[KPSS_CRITICAL.len() - 1]);
    if statistic <= first.1 {
        return first.2;
    }
    if statistic >= last.1 {
        return last.2;
    }
    KPSS_CRITICAL
        .windows(2)
        .find(|w| statistic <= w[1].1)
        .map(|w| {
            let (x0, y0) = (w[0].1, w[0].2);
            let (x1, y1) = (w[1].1, w[1].2);
            y0 + (statistic - x0) * (y1 - y0) / (x1 - x0)
        })
        .unwrap_or(last.2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Deterministic uniform draw in `[0, 1)`.
    fn noise(i: usize) -> f64 {
        let x = (i as f64 * 12.9898).sin() * 43758.5453;
        x - x.floor()
    }

    fn white_noise(n: usize) -> Vec<f64> {
        (0..n).map(|i| noise(i) - 0.5).collect()
    }

    /// Strongly mean-reverting: alternates sign around zero.
    fn alternating(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 } * (1.0 + noise(i)))
            .collect()
    }

    fn random_walk(n: usize, drift: f64) -> Vec<f64> {
        let mut series = vec![0.0; n];
        for i in 1..n {
            series[i] = series[i - 1] + drift + noise(i) - 0.5;
        }
        series
    }

    // ==================== adf_test ====================

    #[test]
    fn adf_stationary_series_rejects_unit_root() {
        let result = adf_test(&white_noise(200), None).unwrap();

        assert!(result.statistic < result.critical_values.get("5%").unwrap());
        assert!(result.p_value < 0.05);
        assert_eq!(result.test, StationarityTest::AugmentedDickeyFuller);
    }

    #[test]
    fn adf_drifting_walk_keeps_unit_root() {
        let result = adf_test(&random_walk(200, 1.0), Some(5)).unwrap();

        assert!(result.statistic.is_finite());
        assert!(result.p_value > 0.05);
    }

    #[test]
    fn adf_p_value_in_unit_interval() {
        let result = adf_test(&random_walk(200, 0.0), None).unwrap();
        assert!((0.0..=1.0).contains(&result.p_value));
        assert!(result.lags <= 15);
    }

    #[test]
    fn adf_lag_search_respects_bound() {
        let result = adf_test(&white_noise(100), Some(2)).unwrap();
        assert!(result.lags <= 2);
        assert_eq!(result.nobs, 99 - result.lags);
    }

    #[test]
    fn adf_short_series_rejected() {
        let series = vec![1.0, 2.0, 3.0];
        assert_eq!(
            adf_test(&series, None).unwrap_err(),
            ForecastError::InsufficientData {
                needed: MIN_STATIONARITY_OBS,
                got: 3
            }
        );
    }

    #[test]
    fn adf_constant_series_is_strongly_negative() {
        let result = adf_test(&[50.0; 35], None).unwrap();
        assert_eq!(result.statistic, f64::NEG_INFINITY);
        assert_eq!(result.p_value, 0.0);
    }

    #[test]
    fn adf_deterministic_growth_keeps_unit_root() {
        let series: Vec<f64> = (0..35).map(|i| 52.0 + 4.0 * i as f64).collect();
        let result = adf_test(&series, None).unwrap();

        assert_eq!(result.statistic, 0.0);
        assert!(result.p_value > 0.9);
        assert_eq!(result.lags, 0);
        assert_eq!(result.nobs, 34);
    }

    #[test]
    fn adf_exact_oscillation_is_strongly_negative() {
        let series: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let result = adf_test(&series, None).unwrap();

        assert_eq!(result.statistic, f64::NEG_INFINITY);
        assert_eq!(result.p_value, 0.0);
        assert_eq!(result.critical_values.len(), 3);
    }

    #[test]
    fn limiting_statistic_serializes_as_string() {
        let result = adf_test(&[50.0; 35], None).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["statistic"], "-inf");
        assert_eq!(json["p_value"], 0.0);

        let finite = serde_json::to_value(adf_test(&white_noise(100), None).unwrap()).unwrap();
        assert!(finite["statistic"].is_f64());
    }

    #[test]
    fn adf_critical_values_are_ordered() {
        let result = adf_test(&white_noise(100), None).unwrap();
        let cv = &result.critical_values;

        assert!(cv.get("1%").unwrap() < cv.get("5%").unwrap());
        assert!(cv.get("5%").unwrap() < cv.get("10%").unwrap());
        assert_eq!(cv.iter().map(|(l, _)| l).collect::<Vec<_>>(), ["1%", "5%", "10%"]);
    }

    #[test]
    fn adf_critical_values_match_mackinnon() {
        // Asymptotic values plus the small-sample correction at n = 100.
        let cv = adf_critical_values(100);
        assert_relative_eq!(cv.get("1%").unwrap(), -3.4981, epsilon = 1e-3);
        assert_relative_eq!(cv.get("5%").unwrap(), -2.8913, epsilon = 1e-3);
        assert_relative_eq!(cv.get("10%").unwrap(), -2.5826, epsilon = 1e-3);
    }

    #[test]
    fn adf_p_value_matches_tabulated_points() {
        assert_relative_eq!(adf_p_value(-3.43), 0.01, epsilon = 2e-3);
        assert_relative_eq!(adf_p_value(-2.86), 0.05, epsilon = 5e-3);
        assert_eq!(adf_p_value(-25.0), 0.0);
        assert_eq!(adf_p_value(3.0), 1.0);
    }

    // ==================== kpss_test ====================

    #[test]
    fn kpss_stationary_series_not_rejected() {
        let result = kpss_test(&alternating(200), Some(4)).unwrap();

        assert!(result.statistic > 0.0);
        assert!(result.statistic < result.critical_values.get("5%").unwrap());
        assert!(result.p_value > 0.05);
    }

    #[test]
    fn kpss_trending_series_rejected() {
        let series: Vec<f64> = (0..200).map(|i| i as f64 * 0.5).collect();

        let result = kpss_test(&series, Some(10)).unwrap();

        assert!(result.statistic > result.critical_values.get("1%").unwrap());
        assert_eq!(result.p_value, 0.01);
    }

    #[test]
    fn kpss_auto_lags_are_bounded() {
        let result = kpss_test(&random_walk(120, 0.0), None).unwrap();
        assert!(result.lags < 120);
        assert!((0.01..=0.10).contains(&result.p_value));
    }

    #[test]
    fn kpss_short_series_rejected() {
        assert!(matches!(
            kpss_test(&[1.0; 11], None),
            Err(ForecastError::InsufficientData { needed: 12, got: 11 })
        ));
    }

    #[test]
    fn kpss_constant_series_is_stationary() {
        let result = kpss_test(&[50.0; 35], None).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 0.10);
    }

    #[test]
    fn kpss_p_value_interpolates_table() {
        assert_relative_eq!(kpss_p_value(0.405), 0.075, epsilon = 1e-9);
        assert_eq!(kpss_p_value(0.1), 0.10);
        assert_eq!(kpss_p_value(2.0), 0.01);
    }

    #[test]
    fn kpss_critical_values_increase() {
        let result = kpss_test(&white_noise(100), None).unwrap();
        let cv = &result.critical_values;
        assert!(cv.get("10%").unwrap() < cv.get("5%").unwrap());
        assert!(cv.get("5%").unwrap() < cv.get("1%").unwrap());
        assert_eq!(cv.len(), 4);
    }

    // ==================== test_stationarity ====================

    #[test]
    fn combined_report_holds_both_tests() {
        let report = test_stationarity(&white_noise(120)).unwrap();
        assert_eq!(report.adf.test, StationarityTest::AugmentedDickeyFuller);
        assert_eq!(report.kpss.test, StationarityTest::Kpss);
    }

    #[test]
    fn critical_values_serialize_as_map() {
        let report = test_stationarity(&white_noise(60)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["adf"]["critical_values"]["5%"].is_number());
        assert!(json["kpss"]["critical_values"]["2.5%"].is_number());
        assert_eq!(json["kpss"]["test"], "kpss");
    }
}
