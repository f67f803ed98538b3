//! Transports to the spreadsheet webhook.
//!
//! Both are one-way: a call that completes counts as delivered and the
//! response body is never read.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use verdict_core::AnalysisEvent;
use verdict_core::event::truncate_chars;
use verdict_core::present::score_display;

use crate::TransportError;

/// Longest review excerpt that fits in a query string.
pub const QUERY_REVIEW_CHARS: usize = 200;
const APPEND_ACTION: &str = "append";

/// A way of getting one event to the webhook.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, event: &AnalysisEvent) -> Result<(), TransportError>;
}

#[derive(Serialize)]
struct AppendRequest<'a> {
    action: &'static str,
    sheet: &'a str,
    data: &'a AnalysisEvent,
}

/// JSON body of the primary transport.
pub fn append_payload(sheet: &str, event: &AnalysisEvent) -> Value {
    // Serializing a struct of strings and finite floats cannot fail.
    serde_json::to_value(AppendRequest {
        action: APPEND_ACTION,
        sheet,
        data: event,
    })
    .unwrap_or(Value::Null)
}

/// Query parameters of the secondary transport, in wire order.
pub fn query_pairs(event: &AnalysisEvent) -> Vec<(&'static str, String)> {
    vec![
        ("action", APPEND_ACTION.to_string()),
        ("timestamp", event.timestamp.clone()),
        (
            "review",
            truncate_chars(&event.review_text, QUERY_REVIEW_CHARS).to_string(),
        ),
        ("sentiment", event.sentiment.as_str().to_string()),
        ("label", event.label.clone()),
        ("score", score_display(event.score)),
        ("confidence", event.confidence_percent.clone()),
        ("source", event.source.clone()),
    ]
}

#[cfg(feature = "http")]
pub use http::{PostTransport, QueryTransport};

#[cfg(feature = "http")]
mod http {
    use super::*;
    use tracing::debug;

    /// Primary transport: POST with a JSON body.
    pub struct PostTransport {
        client: reqwest::Client,
        url: String,
        sheet: String,
    }

    impl PostTransport {
        pub fn new(client: reqwest::Client, url: &str, sheet: &str) -> Self {
            Self {
                client,
                url: url.trim().to_string(),
                sheet: sheet.to_string(),
            }
        }
    }

    #[async_trait]
    impl Transport for PostTransport {
        fn name(&self) -> &'static str {
            "post"
        }

        async fn send(&self, event: &AnalysisEvent) -> Result<(), TransportError> {
            let body = append_payload(&self.sheet, event);
            let resp = self.client.post(&self.url).json(&body).send().await?;
            debug!(url = %self.url, status = resp.status().as_u16(), "event posted");
            Ok(())
        }
    }

    /// Secondary transport: GET with the event in the query string.
    pub struct QueryTransport {
        client: reqwest::Client,
        url: String,
    }

    impl QueryTransport {
        pub fn new(client: reqwest::Client, url: &str) -> Self {
            Self {
                client,
                url: url.trim().to_string(),
            }
        }

        /// Full request address for `event`.
        pub fn request_url(&self, event: &AnalysisEvent) -> Result<reqwest::Url, TransportError> {
            reqwest::Url::parse_with_params(&self.url, query_pairs(event)).map_err(|e| {
                TransportError::InvalidEndpoint {
                    url: self.url.clone(),
                    reason: e.to_string(),
                }
            })
        }
    }

    #[async_trait]
    impl Transport for QueryTransport {
        fn name(&self) -> &'static str {
            "query"
        }

        async fn send(&self, event: &AnalysisEvent) -> Result<(), TransportError> {
            let url = self.request_url(event)?;
            let resp = self.client.get(url).send().await?;
            debug!(url = %self.url, status = resp.status().as_u16(), "event sent as query");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use verdict_core::{SentimentCategory, Verdict};

    fn event(review: &str) -> AnalysisEvent {
        let verdict = Verdict {
            category: SentimentCategory::Negative,
            label: "NEGATIVE".into(),
            score: 0.913,
        };
        let ts = Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap();
        AnalysisEvent::at(ts, review, &verdict, "CLI")
    }

    #[test]
    fn append_payload_wraps_event() {
        let payload = append_payload("SentimentAnalysis", &event("Too slow"));
        assert_eq!(payload["action"], "append");
        assert_eq!(payload["sheet"], "SentimentAnalysis");
        assert_eq!(payload["data"]["review"], "Too slow");
        assert_eq!(payload["data"]["sentiment"], "negative");
        assert_eq!(payload["data"]["confidence"], "91.3");
        assert_eq!(payload["data"]["timestamp"], "2026-05-04T09:00:00.000Z");
    }

    #[test]
    fn query_pairs_cover_every_column() {
        let pairs = query_pairs(&event("Too slow"));
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            [
                "action",
                "timestamp",
                "review",
                "sentiment",
                "label",
                "score",
                "confidence",
                "source"
            ]
        );
        assert_eq!(pairs[5].1, "0.9130");
    }

    #[test]
    fn query_review_is_shorter_than_body_review() {
        let long = "w".repeat(450);
        let e = event(&long);
        assert_eq!(e.review_text.len(), 450);
        let pairs = query_pairs(&e);
        assert_eq!(pairs[2].1.chars().count(), QUERY_REVIEW_CHARS);
    }

    #[cfg(feature = "http")]
    #[test]
    fn request_url_encodes_review() {
        let transport = QueryTransport::new(
            reqwest::Client::new(),
            "https://script.google.com/macros/s/abc/exec",
        );
        let url = transport.request_url(&event("bad & slow?")).unwrap();
        let review: Vec<String> = url
            .query_pairs()
            .filter(|(k, _)| k == "review")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(review, vec!["bad & slow?".to_string()]);
        assert!(!url.as_str().contains("bad & slow?"));
        assert!(url.as_str().starts_with("https://script.google.com/macros/s/abc/exec?action=append"));
    }

    #[cfg(feature = "http")]
    #[test]
    fn request_url_rejects_garbage_endpoint() {
        let transport = QueryTransport::new(reqwest::Client::new(), "not a url");
        let err = transport.request_url(&event("x")).unwrap_err();
        assert!(matches!(err, TransportError::InvalidEndpoint { .. }));
    }
}
