//! Feature standardization with an appended bias column.
//!
//! The bias column is appended *before* rescaling and carries identity
//! parameters (mean 0, std 1), so it stays a column of ones.

use analysis_core::{AnalysisError, AnalysisResult};
use nalgebra::{DMatrix, DVector};
use statrs::statistics::Statistics;

/// Per-column standardization parameters captured at fit time.
///
/// `means` and `stds` have one entry per raw feature plus a trailing entry for
/// the bias column.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StandardScaler {
    means: DVector<f64>,
    stds: DVector<f64>,
}

impl StandardScaler {
    /// Capture mean and population standard deviation of every column of `x`.
    ///
    /// A constant column is centered on its value and left unscaled (std 1),
    /// which turns it into an all-zero column.
    pub fn fit(x: &DMatrix<f64>) -> AnalysisResult<Self> {
        if x.nrows() == 0 {
            return Err(AnalysisError::shape("at least 1 row", "0 rows"));
        }
        let n_features = x.ncols();
        let mut means = DVector::zeros(n_features + 1);
        let mut stds = DVector::from_element(n_features + 1, 1.0);

        for (j, column) in x.column_iter().enumerate() {
            let first = column[0];
            if column.iter().all(|&v| v == first) {
                means[j] = first;
                continue;
            }

            means[j] = column.iter().mean();
            let std = column.iter().population_std_dev();
            if std > 0.0 {
                stds[j] = std;
            }
        }

        Ok(Self { means, stds })
    }

    /// Number of raw features (bias column excluded)
    pub fn n_features(&self) -> usize {
        self.means.len() - 1
    }

    pub fn means(&self) -> &DVector<f64> {
        &self.means
    }

    pub fn stds(&self) -> &DVector<f64> {
        &self.stds
    }

    /// Append a column of ones and standardize every column with the stored
    /// parameters.
    pub fn transform(&self, x: &DMatrix<f64>) -> AnalysisResult<DMatrix<f64>> {
        let n_features = self.n_features();
        if x.ncols() != n_features {
            return Err(AnalysisError::shape(
                format!("{n_features} features"),
                format!("{} features", x.ncols()),
            ));
        }

        Ok(DMatrix::from_fn(x.nrows(), n_features + 1, |i, j| {
            let raw = if j < n_features { x[(i, j)] } else { 1.0 };
            (raw - self.means[j]) / self.stds[j]
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_population_parameters() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let scaler = StandardScaler::fit(&x).unwrap();

        assert_eq!(scaler.n_features(), 1);
        assert_abs_diff_eq!(scaler.means()[0], 1.5, epsilon = 1e-12);
        // Population variance of 0..=3 is 1.25
        assert_abs_diff_eq!(scaler.stds()[0], 1.25_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(scaler.means()[1], 0.0);
        assert_eq!(scaler.stds()[1], 1.0);
    }

    #[test]
    fn test_bias_column_stays_ones() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 10.0, 2.0, 20.0, 3.0, 40.0]);
        let scaler = StandardScaler::fit(&x).unwrap();
        let t = scaler.transform(&x).unwrap();

        assert_eq!(t.ncols(), 3);
        for i in 0..3 {
            assert_eq!(t[(i, 2)], 1.0);
        }
        // Standardized columns have zero mean and unit population variance
        for j in 0..2 {
            let col: Vec<f64> = t.column(j).iter().copied().collect();
            assert_abs_diff_eq!(col.iter().mean(), 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(col.iter().population_std_dev(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_transform_is_deterministic() {
        let days: Vec<f64> = (0..5).map(|d| 1.7e9 + 86_400.0 * d as f64).collect();
        let x = DMatrix::from_row_slice(5, 1, &days);
        let scaler = StandardScaler::fit(&x).unwrap();
        let first = scaler.transform(&x).unwrap();
        let second = scaler.transform(&x).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_constant_column_is_shift_only() {
        let x = DMatrix::from_row_slice(3, 1, &[5.0, 5.0, 5.0]);
        let scaler = StandardScaler::fit(&x).unwrap();
        assert_eq!(scaler.means()[0], 5.0);
        assert_eq!(scaler.stds()[0], 1.0);

        let t = scaler.transform(&x).unwrap();
        assert!(t.column(0).iter().all(|&v| v == 0.0));

        let other = DMatrix::from_row_slice(1, 1, &[7.0]);
        assert_eq!(scaler.transform(&other).unwrap()[(0, 0)], 2.0);
    }

    #[test]
    fn test_shape_errors() {
        let empty = DMatrix::<f64>::zeros(0, 1);
        assert!(matches!(
            StandardScaler::fit(&empty),
            Err(AnalysisError::Shape { .. })
        ));

        let x = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let scaler = StandardScaler::fit(&x).unwrap();
        let wider = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        assert!(matches!(
            scaler.transform(&wider),
            Err(AnalysisError::Shape { .. })
        ));
    }
}
