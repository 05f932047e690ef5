//! Statistical tests for series and model residuals.
//!
//! # Example
//!
//! ```
//! use traffic_forecast::validation::{adf_test, kpss_test};
//!
//! // Monthly increments of a registration count.
//! let series: Vec<f64> = (0..36)
//!     .map(|i| {
//!         let x = (i as f64 * 12.9898).sin() * 43758.5453;
//!         50.0 + 10.0 * (x - x.floor())
//!     })
//!     .collect();
//! let adf = adf_test(&series, None).unwrap();
//! let kpss = kpss_test(&series, None).unwrap();
//! println!("ADF {:.3} (p = {:.3})", adf.statistic, adf.p_value);
//! println!("KPSS {:.3} (p = {:.3})", kpss.statistic, kpss.p_value);
//! ```

pub mod residual_tests;
pub mod stationarity;

pub use residual_tests::{jarque_bera, ljung_box, JarqueBeraResult, LjungBoxResult};
pub use stationarity::{
    adf_test, kpss_test, test_stationarity, CriticalValues, StationarityReport,
    StationarityResult, StationarityTest, MIN_STATIONARITY_OBS,
};
