//! IngestWebhookHandler - Verifies, logs, and reconciles inbound events.
//!
//! The log write is the only step the webhook acknowledgement waits on.
//! A duplicate delivery is acknowledged without reconciling again.

use std::sync::Arc;

use crate::domain::billing::{ReconcileError, StripeEvent};
use crate::domain::foundation::EventId;
use crate::ports::{EventLog, SaveResult, SignatureVerifier};

use super::{EventReconciler, ReconcileOutcome};

/// Command to ingest a webhook delivery.
#[derive(Debug, Clone)]
pub struct IngestWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header value.
    pub signature: String,
}

/// What to do when the event log already holds the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Acknowledge without reconciling (webhook deliveries).
    Skip,
    /// Reconcile again (operator-driven recovery; merges are idempotent).
    Reconcile,
}

/// Result of ingesting one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestResult {
    /// First sighting of the event.
    Recorded {
        event_id: EventId,
        outcome: ReconcileOutcome,
    },
    /// Event was already logged.
    Duplicate {
        event_id: EventId,
        outcome: Option<ReconcileOutcome>,
    },
}

impl IngestResult {
    pub fn event_id(&self) -> &EventId {
        match self {
            IngestResult::Recorded { event_id, .. } | IngestResult::Duplicate { event_id, .. } => {
                event_id
            }
        }
    }

    pub fn outcome(&self) -> Option<&ReconcileOutcome> {
        match self {
            IngestResult::Recorded { outcome, .. } => Some(outcome),
            IngestResult::Duplicate { outcome, .. } => outcome.as_ref(),
        }
    }
}

pub struct IngestWebhookHandler {
    verifier: Arc<dyn SignatureVerifier>,
    event_log: Arc<dyn EventLog>,
    reconciler: Arc<EventReconciler>,
}

impl IngestWebhookHandler {
    pub fn new(
        verifier: Arc<dyn SignatureVerifier>,
        event_log: Arc<dyn EventLog>,
        reconciler: Arc<EventReconciler>,
    ) -> Self {
        Self {
            verifier,
            event_log,
            reconciler,
        }
    }

    /// Verifies and ingests a webhook delivery.
    ///
    /// Fails only on `SignatureInvalid`, `MalformedPayload`, or
    /// `StoreUnavailable` from the log write. Reconciliation failures are
    /// dead-lettered and reported inside the result.
    pub async fn handle(&self, cmd: IngestWebhookCommand) -> Result<IngestResult, ReconcileError> {
        self.verifier.verify(&cmd.payload, &cmd.signature)?;

        let event = StripeEvent::from_slice(&cmd.payload).map_err(|e| {
            tracing::warn!(error = %e, "Verified webhook body is not a Stripe event");
            e
        })?;

        tracing::info!(event_id = %event.id, event_type = %event.event_type, "Received stripe event");

        self.ingest_verified(event, DuplicatePolicy::Skip).await
    }

    /// Logs and reconciles an event that needs no signature check.
    pub async fn ingest_verified(
        &self,
        event: StripeEvent,
        duplicates: DuplicatePolicy,
    ) -> Result<IngestResult, ReconcileError> {
        let saved = self.event_log.record(&event).await.map_err(|e| {
            tracing::error!(event_id = %event.id, error = %e, "Failed to record stripe event");
            ReconcileError::from(e)
        })?;

        match (saved, duplicates) {
            (SaveResult::Inserted, _) => {
                tracing::debug!(event_id = %event.id, "Recorded stripe event");
                let outcome = self.reconciler.reconcile(&event).await;
                Ok(IngestResult::Recorded {
                    event_id: event.id,
                    outcome,
                })
            }
            (SaveResult::AlreadyExists, DuplicatePolicy::Skip) => {
                tracing::info!(event_id = %event.id, "Duplicate stripe event acknowledged");
                Ok(IngestResult::Duplicate {
                    event_id: event.id,
                    outcome: None,
                })
            }
            (SaveResult::AlreadyExists, DuplicatePolicy::Reconcile) => {
                let outcome = self.reconciler.reconcile(&event).await;
                Ok(IngestResult::Duplicate {
                    event_id: event.id,
                    outcome: Some(outcome),
                })
            }
        }
    }
}
