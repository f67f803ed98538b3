//! One review in, one verdict out.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{info, warn};
use verdict_core::{
    NormalizeError, Presentation, SentimentRecord, Verdict, bucket, normalize_output, present,
};

use crate::model::truncate_input;
use crate::{InferenceError, SentimentModel};

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("review text is empty")]
    EmptyInput,

    #[error("another analysis is still running")]
    Busy,

    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("model output rejected: {0}")]
    Output(#[from] NormalizeError),
}

impl AnalyzeError {
    /// Message suitable for showing to the person who submitted the review.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyInput => "Please enter a review text to analyze.",
            Self::Busy => "An analysis is already running. Please wait.",
            Self::Inference(_) | Self::Output(_) => "Analysis failed. Please try again.",
        }
    }
}

/// Result of analysing one review.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The submitted review, trimmed.
    pub review: String,
    pub record: SentimentRecord,
    pub verdict: Verdict,
    pub presentation: Presentation,
}

/// Session-wide analyzer: the loaded model plus a busy flag that keeps
/// analyses from overlapping.
pub struct Analyzer {
    model: Arc<dyn SentimentModel>,
    busy: AtomicBool,
}

impl Analyzer {
    pub fn new(model: Arc<dyn SentimentModel>) -> Self {
        Self {
            model,
            busy: AtomicBool::new(false),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Classify `text`, then bucket and format the top prediction.
    ///
    /// Fails with [`AnalyzeError::Busy`] while another call is in flight.
    /// The analyzer is idle again on every return path.
    pub async fn analyze(&self, text: &str) -> Result<Analysis, AnalyzeError> {
        let review = text.trim();
        if review.is_empty() {
            return Err(AnalyzeError::EmptyInput);
        }

        let _guard = BusyGuard::acquire(&self.busy).ok_or(AnalyzeError::Busy)?;

        let input = truncate_input(review);
        let raw = self.model.classify(&input).await.inspect_err(|e| {
            warn!(model = self.model.name(), error = %e, "model inference failed");
        })?;

        let record = normalize_output(&raw).inspect_err(|e| {
            warn!(model = self.model.name(), error = %e, "unexpected model output");
        })?;
        let verdict = bucket(&record);
        let presentation = present(&verdict);

        info!(
            sentiment = %verdict.category,
            label = %verdict.label,
            confidence = %presentation.confidence_percent,
            "review analysed"
        );

        Ok(Analysis {
            review: review.to_string(),
            record,
            verdict,
            presentation,
        })
    }
}

/// Holds the busy flag for the duration of one analysis.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use verdict_core::SentimentCategory;

    /// Returns a fixed output and records every input it sees.
    struct FixedModel {
        output: Value,
        seen: Mutex<Vec<String>>,
    }

    impl FixedModel {
        fn new(output: Value) -> Arc<Self> {
            Arc::new(Self {
                output,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SentimentModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn classify(&self, text: &str) -> Result<Value, InferenceError> {
            self.seen.lock().unwrap().push(text.to_string());
            tokio::task::yield_now().await;
            Ok(self.output.clone())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl SentimentModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        async fn classify(&self, _text: &str) -> Result<Value, InferenceError> {
            Err(InferenceError::Server {
                status: 503,
                body: "model is loading".into(),
            })
        }
    }

    #[tokio::test]
    async fn analyzes_nested_output() {
        let model = FixedModel::new(json!([[{"label": "NEGATIVE", "score": 0.913}]]));
        let analyzer = Analyzer::new(model.clone());

        let analysis = analyzer.analyze("  Broke after a week.  ").await.unwrap();
        assert_eq!(analysis.review, "Broke after a week.");
        assert_eq!(analysis.verdict.category, SentimentCategory::Negative);
        assert_eq!(analysis.presentation.confidence_percent, "91.3");
        assert_eq!(*model.seen.lock().unwrap(), vec!["Broke after a week."]);
        assert!(!analyzer.is_busy());
    }

    #[tokio::test]
    async fn star_labels_use_score_fallback() {
        let model = FixedModel::new(json!([{"label": "5 stars", "score": 0.7}]));
        let analysis = Analyzer::new(model).analyze("Lovely").await.unwrap();
        assert_eq!(analysis.verdict.category, SentimentCategory::Positive);
        assert_eq!(analysis.verdict.label, "POSITIVE");
        assert_eq!(analysis.record.label(), "5 STARS");
    }

    #[tokio::test]
    async fn long_reviews_are_truncated_before_inference() {
        let model = FixedModel::new(json!([{"label": "POSITIVE", "score": 0.9}]));
        let analyzer = Analyzer::new(model.clone());
        let long = "x".repeat(1500);

        let analysis = analyzer.analyze(&long).await.unwrap();
        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].chars().count(), 1003);
        assert!(seen[0].ends_with("..."));
        assert_eq!(analysis.review.len(), 1500);
    }

    #[tokio::test]
    async fn empty_review_is_rejected_without_inference() {
        let model = FixedModel::new(json!([]));
        let analyzer = Analyzer::new(model.clone());
        let err = analyzer.analyze("   \n ").await.unwrap_err();
        assert!(matches!(err, AnalyzeError::EmptyInput));
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_output_is_reported_and_analyzer_recovers() {
        let analyzer = Analyzer::new(FixedModel::new(json!({"label": "POSITIVE"})));
        let err = analyzer.analyze("ok").await.unwrap_err();
        assert!(matches!(
            err,
            AnalyzeError::Output(NormalizeError::InvalidOutputShape(_))
        ));
        assert_eq!(err.user_message(), "Analysis failed. Please try again.");
        assert!(!analyzer.is_busy());
    }

    #[tokio::test]
    async fn inference_failure_resets_busy_flag() {
        let analyzer = Analyzer::new(Arc::new(FailingModel));
        let err = analyzer.analyze("ok").await.unwrap_err();
        assert!(matches!(err, AnalyzeError::Inference(_)));
        assert!(!analyzer.is_busy());
    }

    #[tokio::test]
    async fn overlapping_analysis_is_refused() {
        let analyzer = Analyzer::new(FixedModel::new(json!([{"label": "POSITIVE", "score": 0.9}])));

        // The first call yields inside the model while holding the flag.
        let (first, second) = tokio::join!(analyzer.analyze("one"), analyzer.analyze("two"));
        assert!(first.is_ok());
        assert!(matches!(second, Err(AnalyzeError::Busy)));

        assert!(analyzer.analyze("three").await.is_ok());
    }
}
