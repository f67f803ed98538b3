use thiserror::Error;

/// Validation failures for raw model output.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("invalid output shape: {0}")]
    InvalidOutputShape(String),

    #[error("invalid output fields: {0}")]
    InvalidOutputFields(String),
}
