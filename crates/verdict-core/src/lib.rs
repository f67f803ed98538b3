pub mod bucket;
pub mod config;
pub mod error;
pub mod event;
pub mod normalize;
pub mod present;
pub mod record;

pub use bucket::{Verdict, bucket};
pub use config::{Backend, ConfigError, ModelSettings, Settings};
pub use error::NormalizeError;
pub use event::AnalysisEvent;
pub use normalize::normalize_output;
pub use present::{IconKey, Presentation, present};
pub use record::{SentimentCategory, SentimentRecord};
