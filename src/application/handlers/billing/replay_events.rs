//! ReplayEventsHandler - Re-drives every logged event through reconciliation.
//!
//! Events are replayed in whatever order the log returns them. The merge is
//! ordered by event `created`, so the final state does not depend on it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::domain::billing::ReconcileError;
use crate::ports::EventLog;

use super::EventReconciler;

/// Summary of a log replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaySummary {
    pub replayed: usize,
    /// Events whose reconciliation was dead-lettered.
    pub failed: usize,
    pub elapsed: Duration,
}

pub struct ReplayEventsHandler {
    event_log: Arc<dyn EventLog>,
    reconciler: Arc<EventReconciler>,
}

impl ReplayEventsHandler {
    pub fn new(event_log: Arc<dyn EventLog>, reconciler: Arc<EventReconciler>) -> Self {
        Self {
            event_log,
            reconciler,
        }
    }

    pub async fn handle(&self) -> Result<ReplaySummary, ReconcileError> {
        let started = Instant::now();
        let events = self.event_log.list_all().await?;
        tracing::warn!(events = events.len(), "Replaying event log");

        let mut failed = 0;
        for event in &events {
            tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Replaying event");
            if self.reconciler.reconcile(event).await.is_failure() {
                failed += 1;
            }
        }

        let summary = ReplaySummary {
            replayed: events.len(),
            failed,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            replayed = summary.replayed,
            failed = summary.failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Event log replay complete"
        );
        Ok(summary)
    }
}
