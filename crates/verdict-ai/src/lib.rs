//! Inference layer: the model boundary, its backends, and the review analyzer.

mod analyzer;
mod error;
mod model;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "remote")]
mod remote;

pub use analyzer::{Analysis, AnalyzeError, Analyzer};
pub use error::InferenceError;
pub use model::{
    MAX_INPUT_CHARS, SentimentModel, load_model, load_with_credential_fallback, truncate_input,
};
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;
#[cfg(feature = "remote")]
pub use remote::HttpModel;
