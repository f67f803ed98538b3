//! Bucketing policy: maps a canonical record onto a sentiment category.
//!
//! Model vocabularies drift (`POSITIVE`, `LABEL_1`, `5 stars`, ...), so the
//! label is matched by substring first and the score alone decides when the
//! label is unfamiliar or its confidence is too low.
//!
//! # Algorithm
//!
//! 1. `POSITIVE` in label and score > 0.5 → positive
//! 2. `NEGATIVE` in label and score > 0.5 → negative
//! 3. `NEUTRAL` in label and score > 0.5 → neutral
//! 4. Otherwise fall back on the score and overwrite the label:
//!    score > 0.66 → positive, score < 0.34 → negative, else neutral.

use crate::record::{SentimentCategory, SentimentRecord};

/// Minimum score for a recognised label to be trusted.
pub const LABEL_THRESHOLD: f64 = 0.5;
/// Fallback: scores above this are positive.
pub const FALLBACK_POSITIVE_ABOVE: f64 = 0.66;
/// Fallback: scores below this are negative.
pub const FALLBACK_NEGATIVE_BELOW: f64 = 0.34;

/// A bucketed record: the category plus the label that explains it.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub category: SentimentCategory,
    /// The model label, or the category name when the fallback decided.
    pub label: String,
    pub score: f64,
}

/// Assign exactly one category to `record`.
pub fn bucket(record: &SentimentRecord) -> Verdict {
    let label = record.label();
    let score = record.score();

    let by_label = [
        ("POSITIVE", SentimentCategory::Positive),
        ("NEGATIVE", SentimentCategory::Negative),
        ("NEUTRAL", SentimentCategory::Neutral),
    ]
    .into_iter()
    .find(|(needle, _)| label.contains(needle) && score > LABEL_THRESHOLD);

    if let Some((_, category)) = by_label {
        return Verdict {
            category,
            label: label.to_string(),
            score,
        };
    }

    let category = if score > FALLBACK_POSITIVE_ABOVE {
        SentimentCategory::Positive
    } else if score < FALLBACK_NEGATIVE_BELOW {
        SentimentCategory::Negative
    } else {
        SentimentCategory::Neutral
    };

    Verdict {
        category,
        label: category.as_str().to_uppercase(),
        score,
    }
}
