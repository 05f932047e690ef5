//! End-to-end forecasting pipeline for monthly registration counts.
//!
//! The pipeline differences the series, tests the differenced series for stationarity,
//! fits an ARIMA(1,1,1) model to the original series and produces a 12-month forecast
//! with 95% confidence bounds. Every call is independent: nothing is cached between runs.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use traffic_forecast::core::TimeSeries;
//! use traffic_forecast::pipeline::ForecastPipeline;
//!
//! let start = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
//! let values: Vec<f64> = (0..36).map(|i| 10_000.0 + 50.0 * i as f64).collect();
//! let series = TimeSeries::from_start(start, values).unwrap();
//!
//! let report = ForecastPipeline::new().run(&series).unwrap();
//! assert_eq!(report.forecast.horizon(), 12);
//! assert_eq!(
//!     report.forecast.timestamps()[0],
//!     NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
//! );
//! ```

use crate::core::{ForecastResult, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::{self, ARIMA};
use crate::models::Forecaster;
use crate::validation::{self, StationarityReport};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

/// Number of monthly periods forecast by the pipeline.
pub const FORECAST_HORIZON: usize = 12;

/// Confidence level of the forecast bounds.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// First differences of a monthly series.
///
/// Element `i` is `values[i + 1] - values[i]`, stamped with the later month of the pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferencedSeries {
    timestamps: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl DifferencedSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Summary statistics of a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDiagnostics {
    pub aic: f64,
    pub bic: f64,
    /// Observations in the undifferenced input.
    pub nobs: usize,
    /// Human-readable estimation report.
    pub summary: String,
}

/// An ARIMA(1,1,1) model fitted to one series.
#[derive(Debug, Clone)]
pub struct FittedModel {
    model: ARIMA,
}

impl FittedModel {
    pub fn aic(&self) -> f64 {
        self.model.aic().unwrap_or(f64::NAN)
    }

    pub fn bic(&self) -> f64 {
        self.model.bic().unwrap_or(f64::NAN)
    }

    pub fn nobs(&self) -> usize {
        self.model.nobs()
    }

    pub fn summary(&self) -> Result<String> {
        self.model.summary()
    }

    pub fn diagnostics(&self) -> Result<ModelDiagnostics> {
        Ok(ModelDiagnostics {
            aic: self.aic(),
            bic: self.bic(),
            nobs: self.nobs(),
            summary: self.summary()?,
        })
    }

    /// The underlying estimated model.
    pub fn model(&self) -> &ARIMA {
        &self.model
    }
}

/// Everything the time-series view displays for one series.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub original: TimeSeries,
    pub differenced: DifferencedSeries,
    pub stationarity: StationarityReport,
    pub diagnostics: ModelDiagnostics,
    pub forecast: ForecastResult,
}

/// Stateless difference / test / fit / forecast pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastPipeline;

impl ForecastPipeline {
    pub fn new() -> Self {
        Self
    }

    /// First-order difference of `series`.
    pub fn difference(&self, series: &TimeSeries) -> Result<DifferencedSeries> {
        if series.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: series.len(),
            });
        }

        Ok(DifferencedSeries {
            timestamps: series.timestamps()[1..].to_vec(),
            values: arima::difference(series.values(), 1),
        })
    }

    /// ADF and KPSS tests on the differenced series.
    ///
    /// The results are informational; they never gate the fit.
    pub fn test_stationarity(&self, differenced: &DifferencedSeries) -> Result<StationarityReport> {
        let report = validation::test_stationarity(differenced.values())?;
        debug!(
            adf = report.adf.statistic,
            adf_p = report.adf.p_value,
            kpss = report.kpss.statistic,
            kpss_p = report.kpss.p_value,
            "stationarity tests complete"
        );
        Ok(report)
    }

    /// Fit a fresh ARIMA(1,1,1) model to the original (undifferenced) series.
    pub fn fit(&self, series: &TimeSeries) -> Result<FittedModel> {
        let mut model = ARIMA::arima_111();
        model.fit(series)?;
        Ok(FittedModel { model })
    }

    /// Forecast the next 12 months after `last_timestamp` with 95% bounds.
    ///
    /// `last_timestamp` must fall in the month of the model's last observation.
    pub fn forecast(&self, model: &FittedModel, last_timestamp: NaiveDate) -> Result<ForecastResult> {
        let (_, sample_end) = model.model.sample().ok_or(ForecastError::FitRequired)?;
        let same_month = sample_end.year() == last_timestamp.year()
            && sample_end.month() == last_timestamp.month();
        if !same_month {
            return Err(ForecastError::InvalidTimestamp(format!(
                "forecast origin {} is not the last fitted month {}",
                last_timestamp.format("%Y-%m"),
                sample_end.format("%Y-%m")
            )));
        }
        let raw = model
            .model
            .predict_with_intervals(FORECAST_HORIZON, CONFIDENCE_LEVEL)?;
        ForecastResult::from_forecast(&raw, last_timestamp, CONFIDENCE_LEVEL)
    }

    /// Run every stage in order; the first failure aborts the run.
    pub fn run(&self, series: &TimeSeries) -> Result<PipelineReport> {
        let last_timestamp = series.last_timestamp().ok_or(ForecastError::EmptyData)?;

        let differenced = self.difference(series)?;
        let stationarity = self.test_stationarity(&differenced)?;
        let fitted = self.fit(series)?;
        let diagnostics = fitted.diagnostics()?;
        let forecast = self.forecast(&fitted, last_timestamp)?;

        info!(
            nobs = diagnostics.nobs,
            aic = diagnostics.aic,
            horizon = forecast.horizon(),
            "pipeline run complete"
        );

        Ok(PipelineReport {
            original: series.clone(),
            differenced,
            stationarity,
            diagnostics,
            forecast,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn series(values: Vec<f64>) -> TimeSeries {
        TimeSeries::from_start(date(2020, 1), values).unwrap()
    }

    fn noise(i: usize) -> f64 {
        let x = (i as f64 * 12.9898 + 78.233).sin() * 43758.5453;
        x - x.floor() - 0.5
    }

    fn wavy(n: usize) -> TimeSeries {
        series(
            (0..n)
                .map(|i| {
                    2_000.0 + 12.0 * i as f64 + 30.0 * (i as f64 * 1.3).sin() + 40.0 * noise(i)
                })
                .collect(),
        )
    }

    #[test]
    fn difference_uses_later_timestamp() {
        let s = series(vec![10.0, 13.0, 11.0]);
        let d = ForecastPipeline::new().difference(&s).unwrap();

        assert_eq!(d.values(), &[3.0, -2.0]);
        assert_eq!(d.timestamps(), &[date(2020, 2), date(2020, 3)]);
    }

    #[test]
    fn difference_of_single_point_fails() {
        let s = series(vec![10.0]);
        assert!(matches!(
            ForecastPipeline::new().difference(&s),
            Err(ForecastError::InsufficientData { needed: 2, got: 1 })
        ));
    }

    #[test]
    fn stationarity_requires_twelve_points() {
        let pipeline = ForecastPipeline::new();
        let d = pipeline.difference(&wavy(12)).unwrap();
        assert!(matches!(
            pipeline.test_stationarity(&d),
            Err(ForecastError::InsufficientData { needed: 12, got: 11 })
        ));
    }

    #[test]
    fn forecast_dates_follow_last_observation() {
        let pipeline = ForecastPipeline::new();
        let s = wavy(30);
        let fitted = pipeline.fit(&s).unwrap();
        let forecast = pipeline.forecast(&fitted, date(2022, 6)).unwrap();

        assert_eq!(forecast.horizon(), FORECAST_HORIZON);
        assert_eq!(forecast.timestamps()[0], date(2022, 7));
        assert_eq!(forecast.timestamps()[11], date(2023, 6));
        assert_relative_eq!(forecast.level(), 0.95);
    }

    #[test]
    fn forecast_origin_must_match_fitted_sample() {
        let pipeline = ForecastPipeline::new();
        let fitted = pipeline.fit(&wavy(30)).unwrap();

        for origin in [date(2022, 5), date(2023, 6), date(2021, 6)] {
            assert!(matches!(
                pipeline.forecast(&fitted, origin),
                Err(ForecastError::InvalidTimestamp(_))
            ));
        }
        assert_eq!(fitted.model().sample().unwrap().1, date(2022, 6));
    }

    #[test]
    fn diagnostics_match_model() {
        let fitted = ForecastPipeline::new().fit(&wavy(40)).unwrap();
        let diag = fitted.diagnostics().unwrap();

        assert_eq!(diag.nobs, 40);
        assert_eq!(diag.aic, fitted.aic());
        assert!(diag.bic > diag.aic);
        assert!(diag.summary.contains("ARIMA(1, 1, 1)"));
    }

    #[test]
    fn run_produces_full_report() {
        let s = wavy(48);
        let report = ForecastPipeline::new().run(&s).unwrap();

        assert_eq!(report.original.len(), 48);
        assert_eq!(report.differenced.len(), 47);
        assert_eq!(report.stationarity.adf.nobs + report.stationarity.adf.lags, 47);
        assert_eq!(report.forecast.horizon(), 12);
        assert_eq!(report.forecast.timestamps()[0], date(2024, 1));
    }

    #[test]
    fn run_aborts_on_short_series() {
        let s = wavy(5);
        assert!(matches!(
            ForecastPipeline::new().run(&s),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn run_on_empty_series() {
        let s = TimeSeries::monthly(vec![], vec![]).unwrap();
        assert!(matches!(
            ForecastPipeline::new().run(&s),
            Err(ForecastError::EmptyData)
        ));
    }

    #[test]
    fn report_serializes_to_json() {
        let report = ForecastPipeline::new().run(&wavy(36)).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["forecast"]["points"].is_array());
        assert_eq!(json["diagnostics"]["nobs"], 36);
        assert!(json["stationarity"]["adf"]["critical_values"]["5%"].is_number());
    }
}
