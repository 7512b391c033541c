//! Ordinary least squares on standardized features.
//!
//! Features are centered and scaled per column, a bias column is
//! appended, and the weights are solved in closed form from the normal
//! equations `XᵗX·w = Xᵗy`. The condition number of `XᵗX` is reported with
//! every fit so ill-conditioned trends are visible to the caller.

use analysis_core::{AnalysisError, AnalysisResult};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::scaler::StandardScaler;

/// Condition number above which a fit is logged as ill-conditioned
pub const DEFAULT_CONDITION_WARNING: f64 = 1e12;

/// Diagnostics returned by [`LinearRegression::fit`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// Weights in standardized space; the last entry is the bias weight
    pub weights: Vec<f64>,
    /// Frobenius condition number ‖A‖·‖A⁻¹‖ of A = XᵗX
    pub condition_number: f64,
    pub n_samples: usize,
    pub n_features: usize,
}

/// Model coefficients expressed in the raw (unstandardized) feature units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub slopes: Vec<f64>,
    pub intercept: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct FittedModel {
    scaler: StandardScaler,
    weights: DVector<f64>,
}

/// Single-output linear regression
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression {
    model: Option<FittedModel>,
    condition_warning: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            model: None,
            condition_warning: DEFAULT_CONDITION_WARNING,
        }
    }

    /// Override the condition number that triggers an ill-conditioning warning
    pub fn with_condition_warning(mut self, threshold: f64) -> Self {
        self.condition_warning = threshold;
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Fit on `x` (rows of features) and `y`, replacing any previous fit.
    ///
    /// On error the model keeps its previous state.
    pub fn fit<R: AsRef<[f64]>>(&mut self, x: &[R], y: &[f64]) -> AnalysisResult<FitReport> {
        let x = design_matrix(x, None)?;
        if y.len() != x.nrows() {
            return Err(AnalysisError::shape(
                format!("{} targets", x.nrows()),
                format!("{} targets", y.len()),
            ));
        }
        if let Some(i) = y.iter().position(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidData(format!(
                "non-finite target at row {i}"
            )));
        }

        let scaler = StandardScaler::fit(&x)?;
        let xs = scaler.transform(&x)?;

        let a = xs.tr_mul(&xs);
        let singular = || AnalysisError::SingularMatrix {
            rows: a.nrows(),
            cols: a.ncols(),
        };
        let a_inv = a.clone().try_inverse().ok_or_else(singular)?;

        // Ill-conditioning alone never aborts; only an unusable inverse does.
        let condition_number = a.norm() * a_inv.norm();
        if !condition_number.is_finite() {
            return Err(singular());
        }

        let y = DVector::from_column_slice(y);
        let weights = &a_inv * xs.tr_mul(&y);
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(singular());
        }

        tracing::debug!(
            samples = x.nrows(),
            features = x.ncols(),
            condition_number,
            "Fitted linear regression"
        );
        if condition_number > self.condition_warning {
            tracing::warn!(
                condition_number,
                threshold = self.condition_warning,
                "Normal-equation matrix is ill-conditioned; trend may be unstable"
            );
        }

        let report = FitReport {
            weights: weights.iter().copied().collect(),
            condition_number,
            n_samples: x.nrows(),
            n_features: x.ncols(),
        };
        self.model = Some(FittedModel { scaler, weights });
        Ok(report)
    }

    /// Predict one value per row of `x` using the fit-time standardization.
    pub fn predict<R: AsRef<[f64]>>(&self, x: &[R]) -> AnalysisResult<Vec<f64>> {
        let model = self.model.as_ref().ok_or(AnalysisError::NotFitted)?;
        if x.is_empty() {
            return Ok(Vec::new());
        }

        let x = design_matrix(x, Some(model.scaler.n_features()))?;
        let predictions = model.scaler.transform(&x)? * &model.weights;
        Ok(predictions.iter().copied().collect())
    }

    /// Slopes and intercept in raw feature units
    pub fn coefficients(&self) -> AnalysisResult<Coefficients> {
        let model = self.model.as_ref().ok_or(AnalysisError::NotFitted)?;
        let n = model.scaler.n_features();
        let means = model.scaler.means();
        let stds = model.scaler.stds();

        let slopes: Vec<f64> = (0..n).map(|j| model.weights[j] / stds[j]).collect();
        let intercept = model.weights[n]
            - slopes
                .iter()
                .enumerate()
                .map(|(j, s)| s * means[j])
                .sum::<f64>();

        Ok(Coefficients { slopes, intercept })
    }

    /// Coefficient of determination R² of the model on `(x, y)`
    pub fn score<R: AsRef<[f64]>>(&self, x: &[R], y: &[f64]) -> AnalysisResult<f64> {
        let predictions = self.predict(x)?;
        if predictions.len() != y.len() {
            return Err(AnalysisError::shape(
                format!("{} targets", predictions.len()),
                format!("{} targets", y.len()),
            ));
        }
        if y.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "cannot score an empty sample".to_string(),
            ));
        }

        let mean = y.iter().sum::<f64>() / y.len() as f64;
        let ss_res: f64 = y
            .iter()
            .zip(&predictions)
            .map(|(t, p)| (t - p).powi(2))
            .sum();
        let ss_tot: f64 = y.iter().map(|t| (t - mean).powi(2)).sum();

        if ss_tot < 1e-15 {
            return Ok(if ss_res < 1e-15 { 1.0 } else { 0.0 });
        }
        Ok(1.0 - ss_res / ss_tot)
    }
}

/// Validate row-major input and copy it into a matrix.
///
/// With `expected_cols` unset, the first row sets the width.
fn design_matrix<R: AsRef<[f64]>>(
    rows: &[R],
    expected_cols: Option<usize>,
) -> AnalysisResult<DMatrix<f64>> {
    let first = rows
        .first()
        .ok_or_else(|| AnalysisError::shape("at least 1 row", "0 rows"))?;
    let n_cols = expected_cols.unwrap_or_else(|| first.as_ref().len());
    if n_cols == 0 {
        return Err(AnalysisError::shape("at least 1 feature", "0 features"));
    }

    for (i, row) in rows.iter().enumerate() {
        let row = row.as_ref();
        if row.len() != n_cols {
            return Err(AnalysisError::shape(
                format!("{n_cols} features"),
                format!("{} features in row {i}", row.len()),
            ));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidData(format!(
                "non-finite feature in row {i}"
            )));
        }
    }

    Ok(DMatrix::from_fn(rows.len(), n_cols, |i, j| rows[i].as_ref()[j]))
}
