//! Session context: the analyzer, the delivery pipeline, and the
//! background deliveries still in flight.

use std::sync::Arc;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use verdict_ai::{Analysis, AnalyzeError, Analyzer};
use verdict_core::AnalysisEvent;
use verdict_sync::DeliveryPipeline;

use crate::display::SessionStatus;

pub struct Session {
    analyzer: Analyzer,
    delivery: Arc<DeliveryPipeline>,
    source: String,
    last: Option<Analysis>,
    pending: Vec<JoinHandle<()>>,
}

impl Session {
    pub fn new(analyzer: Analyzer, delivery: DeliveryPipeline, source: &str) -> Self {
        Self {
            analyzer,
            delivery: Arc::new(delivery),
            source: source.to_string(),
            last: None,
            pending: Vec::new(),
        }
    }

    /// Analyse `text`, hand the result to `render`, then ship the event in
    /// the background.
    ///
    /// Delivery never delays or alters the rendered result.
    pub async fn submit<F>(&mut self, text: &str, render: F) -> Result<&Analysis, AnalyzeError>
    where
        F: FnOnce(&Analysis),
    {
        let analysis = self.analyzer.analyze(text).await?;
        render(&analysis);

        let event = AnalysisEvent::new(&analysis.review, &analysis.verdict, &self.source);
        self.dispatch(event);

        Ok(self.last.insert(analysis))
    }

    fn dispatch(&mut self, event: AnalysisEvent) {
        self.pending.retain(|handle| !handle.is_finished());

        let delivery = Arc::clone(&self.delivery);
        self.pending.push(tokio::spawn(async move {
            match delivery.deliver(&event).await {
                Ok(outcome) => debug!(?outcome, "delivery finished"),
                Err(e) => warn!(error = %e, "could not log analysis to sheet"),
            }
        }));
    }

    /// Flip sheet logging; returns the new state.
    pub fn toggle_logging(&self) -> bool {
        self.delivery.toggle()
    }

    pub fn last(&self) -> Option<&Analysis> {
        self.last.as_ref()
    }

    /// Forget the last result.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn status(&self) -> SessionStatus<'_> {
        SessionStatus {
            model: self.analyzer.model_name(),
            logging: self.delivery.is_enabled(),
            busy: self.analyzer.is_busy(),
            pending: self.pending.iter().filter(|h| !h.is_finished()).count(),
            last: self.last.as_ref(),
        }
    }

    /// Wait for every outstanding delivery.
    pub async fn drain(&mut self) {
        let handles = std::mem::take(&mut self.pending);
        if handles.is_empty() {
            return;
        }
        debug!(count = handles.len(), "waiting for outstanding deliveries");
        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!(error = %e, "delivery task did not complete");
            }
        }
    }
}
