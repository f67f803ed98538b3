use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("review file not found: {0}")]
    FileNotFound(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The first problem the TSV parser reported.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<arrow::error::ArrowError> for StoreError {
    fn from(err: arrow::error::ArrowError) -> Self {
        StoreError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Parse(format!("row conversion: {err}"))
    }
}
