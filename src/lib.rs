//! # traffic-forecast
//!
//! Monthly vehicle-registration forecasting for the Seoul traffic dashboard.
//!
//! Provides first-order differencing, ADF and KPSS stationarity tests, ARIMA(1,1,1)
//! estimation and 12-month interval forecasts, together with the dashboard layer that
//! hosts them: explicit configuration, a static page handler table and a query cache.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, ForecastResult, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::Forecaster;
    pub use crate::pipeline::{ForecastPipeline, PipelineReport};
    pub use crate::utils::quantile_normal;
}
