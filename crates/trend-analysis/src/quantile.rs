use analysis_core::{AnalysisError, AnalysisResult};
use statrs::distribution::{ContinuousCDF, Normal};

/// Standard-normal inverse CDF Φ⁻¹(p) for p in (0, 1)
pub fn inverse_normal_cdf(p: f64) -> AnalysisResult<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(AnalysisError::InvalidParameter(format!(
            "probability must be in (0, 1), got {p}"
        )));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| AnalysisError::CalculationError(e.to_string()))?;
    Ok(normal.inverse_cdf(p))
}

/// Quantile factor z for a two-sided interval: Φ⁻¹((level + 1) / 2).
///
/// 0.95 gives ≈1.96, 0.75 gives ≈1.15.
pub fn two_sided_z(confidence_level: f64) -> AnalysisResult<f64> {
    validate_confidence_level(confidence_level)?;
    inverse_normal_cdf((confidence_level + 1.0) / 2.0)
}

pub fn validate_confidence_level(confidence_level: f64) -> AnalysisResult<()> {
    if confidence_level > 0.0 && confidence_level < 1.0 {
        Ok(())
    } else {
        Err(AnalysisError::InvalidParameter(format!(
            "confidence level must be in (0, 1), got {confidence_level}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_known_quantiles() {
        assert_abs_diff_eq!(two_sided_z(0.95).unwrap(), 1.959964, epsilon = 1e-5);
        assert_abs_diff_eq!(two_sided_z(0.75).unwrap(), 1.150349, epsilon = 1e-5);
        assert_abs_diff_eq!(two_sided_z(0.99).unwrap(), 2.575829, epsilon = 1e-5);
        assert_abs_diff_eq!(inverse_normal_cdf(0.5).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_monotonic_in_level() {
        let levels = [0.1, 0.5, 0.75, 0.9, 0.95, 0.999];
        let zs: Vec<f64> = levels.iter().map(|&l| two_sided_z(l).unwrap()).collect();
        assert!(zs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_rejects_out_of_range() {
        for level in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                two_sided_z(level),
                Err(AnalysisError::InvalidParameter(_))
            ));
        }
        assert!(inverse_normal_cdf(1.0).is_err());
    }
}
