//! Trend Analysis Module
//!
//! Least-squares trend lines over price history and the confidence bands
//! drawn around them.

pub mod confidence;
pub mod quantile;
pub mod regressor;
mod scaler;


pub use confidence::{ConfidenceEstimator, MIN_FIT_ROWS};
pub use quantile::{inverse_normal_cdf, two_sided_z};
pub use regressor::{Coefficients, FitReport, LinearRegression, DEFAULT_CONDITION_WARNING};
