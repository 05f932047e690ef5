//! Core data structures for monthly series and their forecasts.

mod forecast;
mod time_series;

pub use forecast::{Forecast, ForecastPoint, ForecastResult};
pub use time_series::{add_months, month_index, MonthlyRecord, SeriesPoint, TimeSeries};
