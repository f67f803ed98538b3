use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};
use verdict_core::AnalysisEvent;

use crate::{DeliveryError, Transport};

/// How an event reached the sheet, if it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Logging is switched off; nothing was sent.
    Skipped,
    Primary,
    /// The primary transport failed and the fallback went through.
    Secondary,
}

/// Sends events to the sheet with one fallback attempt.
///
/// Delivery never feeds back into the analysis result: callers log the
/// outcome and move on.
pub struct DeliveryPipeline {
    enabled: AtomicBool,
    primary: Box<dyn Transport>,
    secondary: Box<dyn Transport>,
}

impl DeliveryPipeline {
    pub fn new(primary: Box<dyn Transport>, secondary: Box<dyn Transport>, enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            primary,
            secondary,
        }
    }

    /// Build the POST + query pipeline for the configured endpoint.
    ///
    /// Logging starts switched off while the endpoint is still the
    /// placeholder.
    #[cfg(feature = "http")]
    pub fn from_settings(
        settings: &verdict_core::Settings,
    ) -> Result<Self, crate::TransportError> {
        use crate::{PostTransport, QueryTransport};

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self::new(
            Box::new(PostTransport::new(
                client.clone(),
                &settings.endpoint,
                &settings.sheet,
            )),
            Box::new(QueryTransport::new(client, &settings.endpoint)),
            settings.delivery_configured(),
        ))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
        info!(enabled, "sheet logging switched");
    }

    /// Flip the flag; returns the new state.
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::AcqRel);
        info!(enabled, "sheet logging switched");
        enabled
    }

    pub async fn deliver(&self, event: &AnalysisEvent) -> Result<Delivery, DeliveryError> {
        if !self.is_enabled() {
            debug!("sheet logging disabled, event not sent");
            return Ok(Delivery::Skipped);
        }

        let primary = match self.primary.send(event).await {
            Ok(()) => {
                debug!(transport = self.primary.name(), "event delivered");
                return Ok(Delivery::Primary);
            }
            Err(e) => e,
        };
        warn!(
            transport = self.primary.name(),
            error = %primary,
            fallback = self.secondary.name(),
            "primary delivery failed, trying fallback"
        );

        match self.secondary.send(event).await {
            Ok(()) => {
                info!(transport = self.secondary.name(), "event delivered via fallback");
                Ok(Delivery::Secondary)
            }
            Err(secondary) => Err(DeliveryError { primary, secondary }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransportError;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use verdict_core::{SentimentCategory, Verdict};

    struct CountingTransport {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingTransport {
        fn boxed(name: &'static str, fail: bool) -> (Box<dyn Transport>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let t = Self {
                name,
                calls: calls.clone(),
                fail,
            };
            (Box::new(t), calls)
        }
    }

    #[async_trait]
    impl Transport for CountingTransport {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn send(&self, _event: &AnalysisEvent) -> Result<(), TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(TransportError::Other(format!("{} unavailable", self.name)))
            } else {
                Ok(())
            }
        }
    }

    fn event() -> AnalysisEvent {
        let verdict = Verdict {
            category: SentimentCategory::Positive,
            label: "POSITIVE".into(),
            score: 0.97,
        };
        AnalysisEvent::new("Works great", &verdict, "CLI")
    }

    #[tokio::test]
    async fn disabled_pipeline_sends_nothing() {
        let (primary, p_calls) = CountingTransport::boxed("post", false);
        let (secondary, s_calls) = CountingTransport::boxed("query", false);
        let pipeline = DeliveryPipeline::new(primary, secondary, false);

        assert_eq!(pipeline.deliver(&event()).await.unwrap(), Delivery::Skipped);
        assert_eq!(p_calls.load(Ordering::SeqCst), 0);
        assert_eq!(s_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let (primary, p_calls) = CountingTransport::boxed("post", false);
        let (secondary, s_calls) = CountingTransport::boxed("query", false);
        let pipeline = DeliveryPipeline::new(primary, secondary, true);

        assert_eq!(pipeline.deliver(&event()).await.unwrap(), Delivery::Primary);
        assert_eq!(p_calls.load(Ordering::SeqCst), 1);
        assert_eq!(s_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn primary_failure_falls_back_once() {
        let (primary, p_calls) = CountingTransport::boxed("post", true);
        let (secondary, s_calls) = CountingTransport::boxed("query", false);
        let pipeline = DeliveryPipeline::new(primary, secondary, true);

        assert_eq!(pipeline.deliver(&event()).await.unwrap(), Delivery::Secondary);
        assert_eq!(p_calls.load(Ordering::SeqCst), 1);
        assert_eq!(s_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn both_failures_are_reported_together() {
        let (primary, _) = CountingTransport::boxed("post", true);
        let (secondary, s_calls) = CountingTransport::boxed("query", true);
        let pipeline = DeliveryPipeline::new(primary, secondary, true);

        let err = pipeline.deliver(&event()).await.unwrap_err();
        assert_eq!(s_calls.load(Ordering::SeqCst), 1);
        let msg = err.to_string();
        assert!(msg.contains("post unavailable"));
        assert!(msg.contains("query unavailable"));
    }

    #[tokio::test]
    async fn toggle_flips_delivery() {
        let (primary, p_calls) = CountingTransport::boxed("post", false);
        let (secondary, _) = CountingTransport::boxed("query", false);
        let pipeline = DeliveryPipeline::new(primary, secondary, false);

        assert!(pipeline.toggle());
        assert!(pipeline.is_enabled());
        assert_eq!(pipeline.deliver(&event()).await.unwrap(), Delivery::Primary);

        assert!(!pipeline.toggle());
        assert_eq!(pipeline.deliver(&event()).await.unwrap(), Delivery::Skipped);
        assert_eq!(p_calls.load(Ordering::SeqCst), 1);

        pipeline.set_enabled(true);
        assert!(pipeline.is_enabled());
    }

    #[cfg(feature = "http")]
    #[test]
    fn placeholder_endpoint_starts_disabled() {
        let settings = verdict_core::Settings::default();
        let pipeline = DeliveryPipeline::from_settings(&settings).unwrap();
        assert!(!pipeline.is_enabled());
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn unreachable_endpoint_fails_both_transports() {
        let settings = verdict_core::Settings {
            endpoint: "http://127.0.0.1:1/exec".into(),
            timeout_secs: 2,
            ..Default::default()
        };
        let pipeline = DeliveryPipeline::from_settings(&settings).unwrap();
        assert!(pipeline.is_enabled());

        let err = pipeline.deliver(&event()).await.unwrap_err();
        assert!(matches!(err.primary, TransportError::Http(_)));
        assert!(matches!(err.secondary, TransportError::Http(_)));
    }
}
