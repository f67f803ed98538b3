//! Hosted inference API backend.
//!
//! Speaks the Hugging Face text-classification protocol:
//! `POST {api_base}/models/{model_id}` with `{"inputs": text}`, answered by
//! a nested list of `{label, score}` predictions.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};
use verdict_core::ModelSettings;

use crate::model::load_with_credential_fallback;
use crate::{InferenceError, SentimentModel};

/// Short text classified once at load time to confirm the model answers.
const PROBE_TEXT: &str = "The service was fine.";

/// Sentiment model served over HTTP.
#[derive(Clone)]
pub struct HttpModel {
    client: reqwest::Client,
    url: String,
    model_id: String,
    token: Option<String>,
}

impl HttpModel {
    /// Create a client for `model_id` on the API at `api_base`.
    ///
    /// `api_base` should be like `https://router.huggingface.co/hf-inference`
    /// (a trailing slash is tolerated).
    pub fn new(client: reqwest::Client, api_base: &str, model_id: &str, token: Option<String>) -> Self {
        Self {
            client,
            url: format!("{}/models/{}", api_base.trim_end_matches('/'), model_id),
            model_id: model_id.to_string(),
            token,
        }
    }

    /// Build the client and probe the model once.
    ///
    /// A probe rejected while a credential is set is retried anonymously
    /// before the load is declared failed.
    pub async fn load(settings: &ModelSettings, timeout: Duration) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base = Self::new(client, &settings.api_base, &settings.model_id, None);

        let model = load_with_credential_fallback(settings.token.clone(), |token| {
            let candidate = Self {
                token,
                ..base.clone()
            };
            async move {
                candidate.classify(PROBE_TEXT).await?;
                Ok(candidate)
            }
        })
        .await?;

        info!(
            model = %model.model_id,
            authenticated = model.token.is_some(),
            "sentiment model ready"
        );
        Ok(model)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SentimentModel for HttpModel {
    fn name(&self) -> &str {
        &self.model_id
    }

    async fn classify(&self, text: &str) -> Result<Value, InferenceError> {
        debug!(url = %self.url, chars = text.chars().count(), "requesting classification");
        let mut request = self
            .client
            .post(&self.url)
            .header("x-wait-for-model", "true")
            .json(&json!({ "inputs": text }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Server {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_url_trims_trailing_slash() {
        let model = HttpModel::new(
            reqwest::Client::new(),
            "https://router.huggingface.co/hf-inference/",
            "distilbert-base-uncased-finetuned-sst-2-english",
            None,
        );
        assert_eq!(
            model.url(),
            "https://router.huggingface.co/hf-inference/models/distilbert-base-uncased-finetuned-sst-2-english"
        );
        assert_eq!(model.name(), "distilbert-base-uncased-finetuned-sst-2-english");
    }

    #[tokio::test]
    async fn unreachable_api_fails_to_load() {
        let settings = ModelSettings {
            api_base: "http://127.0.0.1:1".into(),
            token: Some("hf_test".into()),
            ..ModelSettings::default()
        };
        let err = HttpModel::load(&settings, Duration::from_secs(2))
            .await
            .err()
            .expect("load should fail");
        assert!(matches!(err, InferenceError::ModelLoad(_)), "got {err:?}");
    }
}
