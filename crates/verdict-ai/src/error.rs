use thiserror::Error;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[cfg(feature = "remote")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("model failed to load: {0}")]
    ModelLoad(String),

    #[error("model runtime error: {0}")]
    Runtime(String),
}
