//! ARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - ARIMA models with arbitrary (p, d, q) orders, fitted by conditional sum of squares
//! - Differencing and integration helpers shared with the pipeline

mod diff;
mod model;

pub use diff::{difference, integrate};
pub use model::{ARIMASpec, ARIMA};
