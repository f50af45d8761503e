use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BallError {
    #[error("Invalid dimension: expected {expected}, got {got}")]
    InvalidDimension {
        expected: usize,
        got: usize,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Non-finite value: {0}")]
    NonFinite(f64),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
}

pub type Result<T> = std::result::Result<T, BallError>;
