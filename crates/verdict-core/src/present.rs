//! Display fields derived from a bucketed result.

use crate::bucket::Verdict;
use crate::record::SentimentCategory;

/// Formatted confidence above which the "strong" explanation is used.
pub const HIGH_CONFIDENCE_PERCENT: f64 = 80.0;

/// Symbolic icon identifier, one per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKey {
    Smile,
    Frown,
    Meh,
}

impl IconKey {
    pub fn for_category(category: SentimentCategory) -> Self {
        match category {
            SentimentCategory::Positive => Self::Smile,
            SentimentCategory::Negative => Self::Frown,
            SentimentCategory::Neutral => Self::Meh,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smile => "fa-smile",
            Self::Frown => "fa-frown",
            Self::Meh => "fa-meh",
        }
    }

    /// Plain-text rendering for terminals.
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Smile => ":)",
            Self::Frown => ":(",
            Self::Meh => ":|",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Presentation {
    pub category: SentimentCategory,
    pub label: String,
    pub icon: IconKey,
    /// Percentage with one decimal place, e.g. `"82.3"`.
    pub confidence_percent: String,
    /// Score with four decimal places, e.g. `"0.8234"`.
    pub score_display: String,
    pub explanation: &'static str,
}

/// Clamp a model score into `[0, 1]`; non-finite scores count as zero.
pub fn sanitize_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Confidence as a percentage string with one decimal place.
pub fn confidence_percent(score: f64) -> String {
    format!("{:.1}", sanitize_score(score) * 100.0)
}

/// Score as a string with four decimal places.
pub fn score_display(score: f64) -> String {
    format!("{:.4}", sanitize_score(score))
}

pub fn present(verdict: &Verdict) -> Presentation {
    let confidence = confidence_percent(verdict.score);
    let high = confidence
        .parse::<f64>()
        .is_ok_and(|pct| pct > HIGH_CONFIDENCE_PERCENT);

    Presentation {
        category: verdict.category,
        label: verdict.label.clone(),
        icon: IconKey::for_category(verdict.category),
        score_display: score_display(verdict.score),
        explanation: explanation(verdict.category, high),
        confidence_percent: confidence,
    }
}

fn explanation(category: SentimentCategory, high_confidence: bool) -> &'static str {
    match (category, high_confidence) {
        (SentimentCategory::Positive, true) => {
            "This review expresses strong positive sentiment. The customer is very satisfied."
        }
        (SentimentCategory::Positive, false) => {
            "This review shows positive sentiment with moderate confidence."
        }
        (SentimentCategory::Negative, true) => {
            "This review expresses strong negative sentiment. Immediate attention may be needed."
        }
        (SentimentCategory::Negative, false) => {
            "This review shows negative sentiment with moderate confidence."
        }
        (SentimentCategory::Neutral, true) => {
            "This review is clearly neutral. The customer is neither pleased nor displeased."
        }
        (SentimentCategory::Neutral, false) => {
            "This review shows neutral or mixed sentiment. The customer may have both positive and negative points."
        }
    }
}
