//! ONNX Runtime backend for sequence-classification models.
//!
//! The model directory must contain `model.onnx`, `tokenizer.json`, and the
//! Hugging Face `config.json` whose `id2label` names the output classes.
//! Output is a flat list of `{label, score}` ranked by softmax probability.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use serde_json::{Value, json};
use tokenizers::Tokenizer;
use tracing::info;

use crate::{InferenceError, SentimentModel};

/// Token limit for BERT-family classifiers.
const MAX_TOKENS: usize = 512;

#[derive(Deserialize)]
struct ModelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

/// Sentiment classifier running locally through ONNX Runtime.
pub struct OnnxModel {
    inner: Arc<Mutex<Inner>>,
    name: String,
}

struct Inner {
    session: Session,
    tokenizer: Tokenizer,
    labels: Vec<String>,
    wants_token_type_ids: bool,
}

impl OnnxModel {
    /// Load a classifier from a directory containing `model.onnx`,
    /// `tokenizer.json`, and `config.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let config_path = model_dir.join("config.json");

        anyhow::ensure!(model_path.exists(), "model.onnx not found in {model_dir:?}");
        anyhow::ensure!(
            tokenizer_path.exists(),
            "tokenizer.json not found in {model_dir:?}"
        );
        anyhow::ensure!(config_path.exists(), "config.json not found in {model_dir:?}");

        let session = Session::builder()?.commit_from_file(&model_path)?;
        let wants_token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: MAX_TOKENS,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

        let config: ModelConfig = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
        let labels = ordered_labels(config.id2label);

        let name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| model_dir.display().to_string());

        info!(model = %model_path.display(), classes = labels.len(), "loaded sentiment model");
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                session,
                tokenizer,
                labels,
                wants_token_type_ids,
            })),
            name,
        })
    }
}

impl Inner {
    /// Score every class for `text`, highest probability first.
    fn predict(&mut self, text: &str) -> anyhow::Result<Vec<(String, f32)>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;

        let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let attention_mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let token_type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();

        let shape = [1i64, input_ids.len() as i64];
        let ids_tensor = Tensor::from_array((shape, input_ids.into_boxed_slice()))?;
        let mask_tensor = Tensor::from_array((shape, attention_mask.into_boxed_slice()))?;

        let outputs = if self.wants_token_type_ids {
            let type_tensor = Tensor::from_array((shape, token_type_ids.into_boxed_slice()))?;
            self.session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor,
            ])?
        } else {
            self.session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])?
        };

        // Logits: [1, num_labels].
        let logits = {
            let (output_shape, data) = outputs[0].try_extract_tensor::<f32>()?;
            let dims: &[i64] = output_shape;
            anyhow::ensure!(
                dims.len() == 2 && dims[0] == 1,
                "unexpected logits shape: {dims:?}, expected [1, num_labels]"
            );
            data.to_vec()
        };
        drop(outputs);

        let mut ranked: Vec<(String, f32)> = softmax(&logits)
            .into_iter()
            .enumerate()
            .map(|(i, p)| (self.label_for(i), p))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(ranked)
    }

    fn label_for(&self, index: usize) -> String {
        self.labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{index}"))
    }
}

#[async_trait]
impl SentimentModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, text: &str) -> Result<Value, InferenceError> {
        let inner = Arc::clone(&self.inner);
        let text = text.to_string();

        let ranked = tokio::task::spawn_blocking(move || {
            let mut inner = inner
                .lock()
                .map_err(|e| anyhow::anyhow!("model lock poisoned: {e}"))?;
            inner.predict(&text)
        })
        .await
        .map_err(|e| InferenceError::Runtime(e.to_string()))?
        .map_err(|e| InferenceError::Runtime(format!("{e:#}")))?;

        Ok(Value::Array(
            ranked
                .into_iter()
                .map(|(label, score)| json!({ "label": label, "score": score }))
                .collect(),
        ))
    }
}

/// `id2label` keys are stringified class indices; order them numerically.
fn ordered_labels(id2label: HashMap<String, String>) -> Vec<String> {
    let mut indexed: Vec<(usize, String)> = id2label
        .into_iter()
        .filter_map(|(k, v)| k.parse::<usize>().ok().map(|i| (i, v)))
        .collect();
    indexed.sort_by_key(|(i, _)| *i);

    let len = indexed.last().map(|(i, _)| i + 1).unwrap_or(0);
    let mut labels: Vec<String> = (0..len).map(|i| format!("LABEL_{i}")).collect();
    for (i, label) in indexed {
        labels[i] = label;
    }
    labels
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}
