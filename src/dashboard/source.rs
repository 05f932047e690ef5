//! Data-source seam for monthly registration series.

use crate::core::{MonthlyRecord, TimeSeries};
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Table holding monthly vehicle registrations.
pub const REGISTRATION_TABLE: &str = "car";

/// Identifies one series in the external store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesQuery {
    pub table: String,
    /// Autonomous district; `None` aggregates the whole city.
    pub district: Option<String>,
}

impl SeriesQuery {
    pub fn new(table: impl Into<String>, district: Option<String>) -> Self {
        Self {
            table: table.into(),
            district,
        }
    }

    /// City-wide monthly registrations.
    pub fn registrations() -> Self {
        Self::new(REGISTRATION_TABLE, None)
    }

    pub fn district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }
}

impl fmt::Display for SeriesQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.district {
            Some(district) => write!(f, "{}[{}]", self.table, district),
            None => f.write_str(&self.table),
        }
    }
}

/// Supplier of monthly series, e.g. a SQL view or a CSV export.
pub trait DataSource {
    /// Load the monthly registration counts selected by `query`.
    fn monthly_registrations(&self, query: &SeriesQuery) -> Result<TimeSeries>;
}

/// Data source backed by series held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    series: HashMap<SeriesQuery, TimeSeries>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, query: SeriesQuery, series: TimeSeries) {
        self.series.insert(query, series);
    }

    pub fn with_series(mut self, query: SeriesQuery, series: TimeSeries) -> Self {
        self.insert(query, series);
        self
    }

    /// Register loader rows (`year`, `month`, `value`) under `query`.
    pub fn insert_records(&mut self, query: SeriesQuery, records: &[MonthlyRecord]) -> Result<()> {
        let series = TimeSeries::from_records(records)?;
        self.insert(query, series);
        Ok(())
    }

    /// Register rows from a JSON array of `{"year", "month", "value"}` objects.
    pub fn insert_json(&mut self, query: SeriesQuery, json: &str) -> Result<()> {
        let records: Vec<MonthlyRecord> =
            serde_json::from_str(json).map_err(|e| ForecastError::DataSource(e.to_string()))?;
        self.insert_records(query, &records)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl DataSource for InMemorySource {
    fn monthly_registrations(&self, query: &SeriesQuery) -> Result<TimeSeries> {
        self.series
            .get(query)
            .cloned()
            .ok_or_else(|| ForecastError::DataSource(format!("no series for {query}")))
    }
}
