//! Canonical sentiment types shared by every verdict crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The top prediction of a model, in canonical form.
///
/// The label is uppercased on construction so that downstream code can
/// match it with plain substring checks.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentRecord {
    label: String,
    score: f64,
}

impl SentimentRecord {
    pub fn new(label: &str, score: f64) -> Self {
        Self {
            label: label.to_uppercase(),
            score,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn score(&self) -> f64 {
        self.score
    }
}

/// One of the three buckets a review can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentCategory {
    Positive,
    Negative,
    Neutral,
}

impl SentimentCategory {
    pub const ALL: [SentimentCategory; 3] = [Self::Positive, Self::Negative, Self::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
