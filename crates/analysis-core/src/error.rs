use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error(
        "Normal-equation matrix ({rows}x{cols}) is not invertible; \
         data may be insufficient or collinear"
    )]
    SingularMatrix { rows: usize, cols: usize },

    #[error("Model has not been fitted")]
    NotFitted,

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

impl AnalysisError {
    pub fn shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        AnalysisError::Shape {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
