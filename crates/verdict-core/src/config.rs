//! Runtime settings: logging endpoint, sheet, and model selection.
//!
//! Resolution order, highest first:
//! 1. Command-line flag
//! 2. Environment variable
//! 3. TOML config file (`--config`, else `./verdict.toml` when present)
//! 4. Compiled default
//!
//! Layers 1 and 2 are applied by the binary on top of [`Settings::load`].

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Endpoint shipped in the sample configuration. Delivery stays off until
/// an operator replaces it.
pub const PLACEHOLDER_ENDPOINT: &str = "https://script.google.com/macros/s/YOUR_SCRIPT_ID/exec";
const PLACEHOLDER_MARKER: &str = "YOUR_SCRIPT_ID";

pub const DEFAULT_CONFIG_FILE: &str = "verdict.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Which inference backend classifies reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Hosted inference API over HTTP.
    #[default]
    Remote,
    /// Local ONNX model directory.
    Onnx,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Onnx => "onnx",
        }
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" | "http" => Ok(Self::Remote),
            "onnx" | "local" => Ok(Self::Onnx),
            _ => Err(ConfigError::InvalidValue {
                key: "model.backend",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub backend: Backend,
    pub model_id: String,
    /// Base URL of the hosted inference API (no trailing slash).
    pub api_base: String,
    /// Bearer credential for the hosted API.
    pub token: Option<String>,
    /// Directory with `model.onnx`, `tokenizer.json`, and `config.json`.
    pub model_dir: Option<PathBuf>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            backend: Backend::Remote,
            model_id: "nlptown/bert-base-multilingual-uncased-sentiment".into(),
            api_base: "https://router.huggingface.co/hf-inference".into(),
            token: None,
            model_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Spreadsheet webhook address.
    pub endpoint: String,
    /// Target sheet inside the spreadsheet.
    pub sheet: String,
    /// Tag written to the `source` column of every event.
    pub source: String,
    /// Timeout applied to every outbound HTTP call.
    pub timeout_secs: u64,
    /// Column holding review text in batch files.
    pub text_column: String,
    pub model: ModelSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: PLACEHOLDER_ENDPOINT.into(),
            sheet: "SentimentAnalysis".into(),
            source: "CLI".into(),
            timeout_secs: 15,
            text_column: "text".into(),
            model: ModelSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from `./verdict.toml` when no path is
    /// given and that file exists. Falls back to defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::from_file(path)
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Whether the endpoint has been replaced with a real webhook address.
    pub fn delivery_configured(&self) -> bool {
        let configured = is_configured_endpoint(&self.endpoint);
        if !configured {
            warn!(
                endpoint = %self.endpoint,
                "logging endpoint is not configured, delivery disabled"
            );
        }
        configured
    }

    /// Copy with the credential masked, for printing.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.model.token.is_some() {
            copy.model.token = Some("***".into());
        }
        copy
    }
}

/// `false` for empty endpoints and for the shipped placeholder.
pub fn is_configured_endpoint(endpoint: &str) -> bool {
    let endpoint = endpoint.trim();
    !endpoint.is_empty() && !endpoint.contains(PLACEHOLDER_MARKER)
}
