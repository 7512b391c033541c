//! Linear trend with a symmetric confidence band.
//!
//! The trend is fitted on a date window of the series and evaluated over the
//! whole series, so the band extrapolates outside the window. Band half-width
//! is `σ·z`, where σ is the population std of residuals inside the window and
//! z the two-sided standard-normal quantile of the confidence level.

use analysis_core::{
    timestamp_to_ordinal, AnalysisError, AnalysisResult, ConfidenceBand, PriceColumn, PriceTable,
};
use chrono::{DateTime, Utc};
use statrs::statistics::Statistics;

use crate::quantile::{two_sided_z, validate_confidence_level};
use crate::regressor::{LinearRegression, DEFAULT_CONDITION_WARNING};

/// Minimum rows inside the fitting window
pub const MIN_FIT_ROWS: usize = 2;

/// Fits a fresh [`LinearRegression`] per request; holds no state between calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceEstimator {
    condition_warning: f64,
}

impl Default for ConfidenceEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfidenceEstimator {
    pub fn new() -> Self {
        Self {
            condition_warning: DEFAULT_CONDITION_WARNING,
        }
    }

    pub fn with_condition_warning(threshold: f64) -> Self {
        Self {
            condition_warning: threshold,
        }
    }

    /// Fit `column` on rows with timestamps in `[lower_bound, upper_bound]` and
    /// band the prediction over every row of `table`.
    pub fn compute<T: PriceTable + ?Sized>(
        &self,
        table: &T,
        column: PriceColumn,
        confidence_level: f64,
        lower_bound: DateTime<Utc>,
        upper_bound: DateTime<Utc>,
    ) -> AnalysisResult<ConfidenceBand> {
        if lower_bound > upper_bound {
            return Err(AnalysisError::InvalidParameter(format!(
                "lower bound {lower_bound} is after upper bound {upper_bound}"
            )));
        }
        self.compute_ordinal(
            table,
            column,
            confidence_level,
            timestamp_to_ordinal(&lower_bound),
            timestamp_to_ordinal(&upper_bound),
        )
    }

    /// Same as [`compute`](Self::compute) with the window given as ordinal keys.
    pub fn compute_ordinal<T: PriceTable + ?Sized>(
        &self,
        table: &T,
        column: PriceColumn,
        confidence_level: f64,
        lower_bound: f64,
        upper_bound: f64,
    ) -> AnalysisResult<ConfidenceBand> {
        validate_confidence_level(confidence_level)?;
        if !(lower_bound <= upper_bound) {
            return Err(AnalysisError::InvalidParameter(format!(
                "invalid window [{lower_bound}, {upper_bound}]"
            )));
        }

        let keys: Vec<f64> = (0..table.row_count()).map(|i| table.ordinal_at(i)).collect();

        let (fit_x, fit_y): (Vec<[f64; 1]>, Vec<f64>) = keys
            .iter()
            .enumerate()
            .filter(|(_, &k)| k >= lower_bound && k <= upper_bound)
            .map(|(i, &k)| ([k], table.value_at(i, column)))
            .unzip();

        if fit_x.len() < MIN_FIT_ROWS {
            return Err(AnalysisError::InsufficientData(format!(
                "{} row(s) of {column} inside the fitting window, need at least \
                 {MIN_FIT_ROWS}; choose a wider date range",
                fit_x.len()
            )));
        }

        let mut model = LinearRegression::new().with_condition_warning(self.condition_warning);
        let report = model.fit(&fit_x, &fit_y)?;

        let full_x: Vec<[f64; 1]> = keys.iter().map(|&k| [k]).collect();
        let predicted = model.predict(&full_x)?;

        let fitted = model.predict(&fit_x)?;
        let sigma = fit_y
            .iter()
            .zip(&fitted)
            .map(|(y, y_hat)| y - y_hat)
            .population_std_dev();

        let z = two_sided_z(confidence_level)?;
        let half_width = sigma * z;

        let lower = predicted.iter().map(|p| p - half_width).collect();
        let upper = predicted.iter().map(|p| p + half_width).collect();

        tracing::debug!(
            %column,
            confidence_level,
            fit_rows = fit_x.len(),
            total_rows = keys.len(),
            sigma,
            z,
            "Computed confidence band"
        );

        Ok(ConfidenceBand {
            x: keys,
            predicted,
            lower,
            upper,
            confidence_level,
            sigma,
            z,
            fit_rows: fit_x.len(),
            condition_number: report.condition_number,
        })
    }

    /// One band per confidence level over the same window, in the order given
    pub fn compute_levels<T: PriceTable + ?Sized>(
        &self,
        table: &T,
        column: PriceColumn,
        confidence_levels: &[f64],
        lower_bound: DateTime<Utc>,
        upper_bound: DateTime<Utc>,
    ) -> AnalysisResult<Vec<ConfidenceBand>> {
        confidence_levels
            .iter()
            .map(|&level| self.compute(table, column, level, lower_bound, upper_bound))
            .collect()
    }
}
