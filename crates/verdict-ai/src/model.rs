//! The model boundary and backend selection.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};
use verdict_core::event::truncate_chars;
use verdict_core::{Backend, ModelSettings};

use crate::InferenceError;

/// Longest review text handed to a model before truncation.
pub const MAX_INPUT_CHARS: usize = 1000;
const TRUNCATION_MARKER: &str = "...";

/// A pretrained sentiment classifier.
///
/// Implementations return the backend's raw, untyped output; shape
/// validation happens in [`verdict_core::normalize_output`].
#[async_trait]
pub trait SentimentModel: Send + Sync {
    /// Model identifier for logs and display.
    fn name(&self) -> &str;

    async fn classify(&self, text: &str) -> Result<Value, InferenceError>;
}

/// Cut `text` to [`MAX_INPUT_CHARS`] characters, marking the cut with `...`.
pub fn truncate_input(text: &str) -> String {
    let head = truncate_chars(text, MAX_INPUT_CHARS);
    if head.len() < text.len() {
        format!("{head}{TRUNCATION_MARKER}")
    } else {
        text.to_string()
    }
}

/// Build the configured backend, ready to classify.
///
/// Loading happens once per session; the returned handle is shared
/// read-only by every analysis.
pub async fn load_model(
    settings: &ModelSettings,
    timeout: Duration,
) -> Result<Arc<dyn SentimentModel>, InferenceError> {
    info!(backend = settings.backend.as_str(), model = %settings.model_id, "loading sentiment model");
    match settings.backend {
        Backend::Remote => load_remote(settings, timeout).await,
        Backend::Onnx => load_onnx(settings).await,
    }
}

#[cfg(feature = "remote")]
async fn load_remote(
    settings: &ModelSettings,
    timeout: Duration,
) -> Result<Arc<dyn SentimentModel>, InferenceError> {
    let model = crate::remote::HttpModel::load(settings, timeout).await?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "remote"))]
async fn load_remote(
    _settings: &ModelSettings,
    _timeout: Duration,
) -> Result<Arc<dyn SentimentModel>, InferenceError> {
    Err(InferenceError::ModelLoad(
        "built without the `remote` feature".into(),
    ))
}

#[cfg(feature = "onnx")]
async fn load_onnx(settings: &ModelSettings) -> Result<Arc<dyn SentimentModel>, InferenceError> {
    let dir = settings
        .model_dir
        .clone()
        .ok_or_else(|| InferenceError::ModelLoad("model_dir is required for the onnx backend".into()))?;
    let model = tokio::task::spawn_blocking(move || crate::onnx::OnnxModel::load(&dir))
        .await
        .map_err(|e| InferenceError::ModelLoad(e.to_string()))?
        .map_err(|e| InferenceError::ModelLoad(format!("{e:#}")))?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "onnx"))]
async fn load_onnx(_settings: &ModelSettings) -> Result<Arc<dyn SentimentModel>, InferenceError> {
    Err(InferenceError::ModelLoad(
        "built without the `onnx` feature".into(),
    ))
}

/// Run a load `attempt` with `token`; if that fails and a token was given,
/// retry once without it. The final failure becomes
/// [`InferenceError::ModelLoad`].
pub async fn load_with_credential_fallback<T, F, Fut>(
    token: Option<String>,
    mut attempt: F,
) -> Result<T, InferenceError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<T, InferenceError>>,
{
    let had_token = token.is_some();
    match attempt(token).await {
        Ok(loaded) => Ok(loaded),
        Err(err) if had_token => {
            warn!(error = %err, "model load failed with credential, retrying without");
            attempt(None)
                .await
                .map_err(|e| InferenceError::ModelLoad(e.to_string()))
        }
        Err(err) => Err(InferenceError::ModelLoad(err.to_string())),
    }
}
