//! Forecast result structures for holding predictions.

use crate::core::time_series::{add_months, month_index};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// Raw model output: point predictions and optional interval bounds, by step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
    lower: Option<Vec<f64>>,
    upper: Option<Vec<f64>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            lower: None,
            upper: None,
        }
    }

    /// Create a forecast with prediction intervals.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Self {
        Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn primary(&self) -> &[f64] {
        &self.point
    }

    pub fn has_lower(&self) -> bool {
        self.lower.is_some()
    }

    pub fn has_upper(&self) -> bool {
        self.upper.is_some()
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }
}

/// A single forecasted month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub timestamp: NaiveDate,
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Dated forecast with confidence bounds at a fixed level.
///
/// Timestamps are the consecutive months following the last observation, and every
/// point satisfies `lower <= point <= upper`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    level: f64,
    points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Attach monthly timestamps to an interval forecast.
    ///
    /// Step `h` (1-based) is stamped `last_timestamp + h` months.
    pub fn from_forecast(
        forecast: &Forecast,
        last_timestamp: NaiveDate,
        level: f64,
    ) -> Result<Self> {
        let horizon = forecast.horizon();
        let lower = forecast.lower().ok_or_else(|| {
            ForecastError::ComputationError("forecast has no lower bounds".into())
        })?;
        let upper = forecast.upper().ok_or_else(|| {
            ForecastError::ComputationError("forecast has no upper bounds".into())
        })?;
        if lower.len() != horizon {
            return Err(ForecastError::DimensionMismatch {
                expected: horizon,
                got: lower.len(),
            });
        }
        if upper.len() != horizon {
            return Err(ForecastError::DimensionMismatch {
                expected: horizon,
                got: upper.len(),
            });
        }

        let mut points = Vec::with_capacity(horizon);
        for (i, &point) in forecast.primary().iter().enumerate() {
            if !point.is_finite() || !lower[i].is_finite() || !upper[i].is_finite() {
                return Err(ForecastError::ComputationError(format!(
                    "non-finite forecast at step {}",
                    i + 1
                )));
            }
            points.push(ForecastPoint {
                timestamp: add_months(last_timestamp, i as u32 + 1)?,
                point,
                lower: lower[i].min(point),
                upper: upper[i].max(point),
            });
        }

        Ok(Self { level, points })
    }

    /// Confidence level of the bounds (e.g. 0.95).
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn horizon(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    pub fn timestamps(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn point_estimates(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.point).collect()
    }

    pub fn lower(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lower).collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.upper).collect()
    }

    /// Whether the timestamps advance by exactly one month per step.
    pub fn is_contiguous(&self) -> bool {
        self.points
            .windows(2)
            .all(|w| month_index(w[1].timestamp) - month_index(w[0].timestamp) == 1)
    }
}
