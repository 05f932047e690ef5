//! Monthly time series with calendar-month timestamps.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Index of the calendar month containing `date` (`year * 12 + month0`).
///
/// Two dates share a month exactly when their indices are equal, and consecutive months
/// differ by one.
pub fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// The date `months` calendar months after `date`.
///
/// The day of month is kept where possible and clamped to the last day of shorter
/// months, so `2024-01-31 + 1` is `2024-02-29`.
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| {
            ForecastError::InvalidTimestamp(format!("{date} + {months} months is out of range"))
        })
}

/// A single row as delivered by the external loader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub year: i32,
    pub month: u32,
    pub value: f64,
}

/// One observation of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: NaiveDate,
    pub value: f64,
}

/// An ordered series with one observation per calendar month.
///
/// Construction validates that timestamps fall in strictly increasing months and that
/// every value is finite; the series is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    timestamps: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a monthly series from parallel timestamp and value vectors.
    pub fn monthly(timestamps: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        for pair in timestamps.windows(2) {
            let (prev, next) = (month_index(pair[0]), month_index(pair[1]));
            if next == prev {
                return Err(ForecastError::InvalidTimestamp(format!(
                    "duplicate month {}",
                    pair[1].format("%Y-%m")
                )));
            }
            if next < prev {
                return Err(ForecastError::InvalidTimestamp(format!(
                    "{} follows {}; months must be strictly increasing",
                    pair[1].format("%Y-%m"),
                    pair[0].format("%Y-%m")
                )));
            }
        }

        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }

        Ok(Self { timestamps, values })
    }

    /// Create a series of consecutive months beginning at `start`.
    pub fn from_start(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        let timestamps = (0..values.len() as u32)
            .map(|i| add_months(start, i))
            .collect::<Result<Vec<_>>>()?;
        Self::monthly(timestamps, values)
    }

    /// Create a series from loader rows, stamping each on the first day of its month.
    pub fn from_records(records: &[MonthlyRecord]) -> Result<Self> {
        let mut timestamps = Vec::with_capacity(records.len());
        let mut values = Vec::with_capacity(records.len());
        for record in records {
            let date = NaiveDate::from_ymd_opt(record.year, record.month, 1).ok_or_else(|| {
                ForecastError::InvalidTimestamp(format!(
                    "{}-{:02} is not a calendar month",
                    record.year, record.month
                ))
            })?;
            timestamps.push(date);
            values.push(record.value);
        }
        Self::monthly(timestamps, values)
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Timestamp of the final observation, if any.
    pub fn last_timestamp(&self) -> Option<NaiveDate> {
        self.timestamps.last().copied()
    }

    /// Iterate over `(timestamp, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = SeriesPoint> + '_ {
        self.timestamps
            .iter()
            .zip(self.values.iter())
            .map(|(&timestamp, &value)| SeriesPoint { timestamp, value })
    }

    /// Whether consecutive observations are exactly one month apart.
    pub fn is_contiguous(&self) -> bool {
        self.timestamps
            .windows(2)
            .all(|w| month_index(w[1]) - month_index(w[0]) == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn from_start_builds_consecutive_months() {
        let ts = TimeSeries::from_start(ymd(2022, 11, 1), vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(
            ts.timestamps(),
            &[ymd(2022, 11, 1), ymd(2022, 12, 1), ymd(2023, 1, 1), ymd(2023, 2, 1)]
        );
        assert!(ts.is_contiguous());
        assert_eq!(ts.last_timestamp(), Some(ymd(2023, 2, 1)));
    }

    #[test]
    fn duplicate_month_rejected() {
        let err = TimeSeries::monthly(vec![ymd(2023, 1, 1), ymd(2023, 1, 15)], vec![1.0, 2.0])
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidTimestamp(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn decreasing_months_rejected() {
        let err = TimeSeries::monthly(vec![ymd(2023, 3, 1), ymd(2023, 2, 1)], vec![1.0, 2.0])
            .unwrap_err();
        assert!(matches!(err, ForecastError::InvalidTimestamp(_)));
    }

    #[test]
    fn length_mismatch_rejected() {
        let err = TimeSeries::monthly(vec![ymd(2023, 1, 1)], vec![1.0, 2.0]).unwrap_err();
        assert_eq!(
            err,
            ForecastError::DimensionMismatch {
                expected: 1,
                got: 2
            }
        );
    }

    #[test]
    fn non_finite_values_rejected() {
        let err = TimeSeries::from_start(ymd(2023, 1, 1), vec![1.0, f64::NAN]).unwrap_err();
        assert_eq!(err, ForecastError::MissingValues);
    }

    #[test]
    fn records_are_stamped_on_first_of_month() {
        let records = [
            MonthlyRecord { year: 2020, month: 12, value: 3_100_000.0 },
            MonthlyRecord { year: 2021, month: 1, value: 3_101_250.0 },
        ];
        let ts = TimeSeries::from_records(&records).unwrap();
        assert_eq!(ts.timestamps(), &[ymd(2020, 12, 1), ymd(2021, 1, 1)]);
        assert_eq!(ts.values(), &[3_100_000.0, 3_101_250.0]);
    }

    #[test]
    fn invalid_record_month_rejected() {
        let records = [MonthlyRecord { year: 2020, month: 13, value: 1.0 }];
        assert!(matches!(
            TimeSeries::from_records(&records),
            Err(ForecastError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn gaps_are_allowed_but_not_contiguous() {
        let ts = TimeSeries::monthly(vec![ymd(2023, 1, 1), ymd(2023, 3, 1)], vec![1.0, 2.0]).unwrap();
        assert!(!ts.is_contiguous());
    }

    #[test]
    fn add_months_clamps_to_month_end() {
        assert_eq!(add_months(ymd(2024, 1, 31), 1).unwrap(), ymd(2024, 2, 29));
        assert_eq!(add_months(ymd(2024, 1, 31), 2).unwrap(), ymd(2024, 3, 31));
        assert_eq!(month_index(ymd(2024, 1, 31)) + 1, month_index(ymd(2024, 2, 29)));
    }
}
