//! RecoverEventHandler - Fetches one event from Stripe and ingests it.
//!
//! For deliveries Stripe gave up on. The event is read from the API, so no
//! signature check applies, and it is reconciled even if already logged.

use std::sync::Arc;

use crate::domain::billing::ReconcileError;
use crate::domain::foundation::EventId;
use crate::ports::EventSource;

use super::{DuplicatePolicy, IngestResult, IngestWebhookHandler};

pub struct RecoverEventHandler {
    source: Arc<dyn EventSource>,
    ingest: Arc<IngestWebhookHandler>,
}

impl RecoverEventHandler {
    pub fn new(source: Arc<dyn EventSource>, ingest: Arc<IngestWebhookHandler>) -> Self {
        Self { source, ingest }
    }

    pub async fn handle(&self, event_id: &EventId) -> Result<IngestResult, ReconcileError> {
        tracing::warn!(event_id = %event_id, "Recovering event from Stripe");
        let event = self.source.retrieve_event(event_id).await?;
        self.ingest.ingest_verified(event, DuplicatePolicy::Reconcile).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::billing::test_support::{checkout, Harness, StubEventSource};

    #[tokio::test]
    async fn recovers_event_missing_from_the_log() {
        let h = Harness::new();
        let source = Arc::new(StubEventSource::new(vec![checkout("evt_1", 1_000, "cus_1", "acct_1")]));
        let handler = RecoverEventHandler::new(source, h.ingest.clone());

        let result = handler.handle(&EventId::new("evt_1").unwrap()).await.unwrap();

        assert!(matches!(result, IngestResult::Recorded { .. }));
        assert_eq!(h.event_log.len().await, 1);
    }

    #[tokio::test]
    async fn recovering_a_logged_event_reconciles_it_again() {
        let h = Harness::new();
        let event = checkout("evt_1", 1_000, "cus_1", "acct_1");
        h.ingest.handle(h.signed(&event)).await.unwrap();
        let handler = RecoverEventHandler::new(Arc::new(StubEventSource::new(vec![event])), h.ingest.clone());

        let result = handler.handle(&EventId::new("evt_1").unwrap()).await.unwrap();

        assert!(matches!(result, IngestResult::Duplicate { outcome: Some(_), .. }));
    }

    #[tokio::test]
    async fn unknown_event_is_an_upstream_failure() {
        let h = Harness::new();
        let handler = RecoverEventHandler::new(Arc::new(StubEventSource::new(Vec::new())), h.ingest.clone());

        let err = handler.handle(&EventId::new("evt_404").unwrap()).await.unwrap_err();

        assert!(matches!(err, ReconcileError::UpstreamFetchFailed(_)));
    }
}
