//! The analysis event shipped to the spreadsheet logger.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::bucket::Verdict;
use crate::present::{confidence_percent, sanitize_score};
use crate::record::SentimentCategory;

/// Longest review excerpt carried by an event.
pub const MAX_REVIEW_CHARS: usize = 500;

/// One completed classification, ready for delivery.
///
/// Field names on the wire match the columns of the logging sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEvent {
    /// ISO 8601 timestamp string (UTC, millisecond precision).
    pub timestamp: String,
    #[serde(rename = "review")]
    pub review_text: String,
    pub sentiment: SentimentCategory,
    pub label: String,
    pub score: f64,
    #[serde(rename = "confidence")]
    pub confidence_percent: String,
    pub source: String,
}

impl AnalysisEvent {
    /// Build an event stamped with the current time.
    pub fn new(review: &str, verdict: &Verdict, source: &str) -> Self {
        Self::at(Utc::now(), review, verdict, source)
    }

    pub fn at(timestamp: DateTime<Utc>, review: &str, verdict: &Verdict, source: &str) -> Self {
        Self {
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            review_text: truncate_chars(review, MAX_REVIEW_CHARS).to_string(),
            sentiment: verdict.category,
            label: verdict.label.clone(),
            score: sanitize_score(verdict.score),
            confidence_percent: confidence_percent(verdict.score),
            source: source.to_string(),
        }
    }
}

/// Longest prefix of `s` holding at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn verdict() -> Verdict {
        Verdict {
            category: SentimentCategory::Positive,
            label: "POSITIVE".into(),
            score: 0.9876,
        }
    }

    #[test]
    fn event_fields_from_verdict() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let event = AnalysisEvent::at(ts, "Great value", &verdict(), "CLI");
        assert_eq!(event.timestamp, "2026-03-01T12:30:00.000Z");
        assert_eq!(event.review_text, "Great value");
        assert_eq!(event.sentiment, SentimentCategory::Positive);
        assert_eq!(event.confidence_percent, "98.8");
        assert_eq!(event.source, "CLI");
    }

    #[test]
    fn long_review_is_truncated() {
        let review = "é".repeat(MAX_REVIEW_CHARS + 20);
        let event = AnalysisEvent::new(&review, &verdict(), "CLI");
        assert_eq!(event.review_text.chars().count(), MAX_REVIEW_CHARS);
    }

    #[test]
    fn wire_names_match_sheet_columns() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let event = AnalysisEvent::at(ts, "ok", &verdict(), "CLI");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["review"], "ok");
        assert_eq!(json["confidence"], "98.8");
        assert_eq!(json["sentiment"], "positive");
        assert!(json.get("review_text").is_none());
    }

    #[test]
    fn truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("ab", 3), "ab");
        assert_eq!(truncate_chars("ñandú", 4), "ñand");
        assert_eq!(truncate_chars("", 0), "");
    }
}
