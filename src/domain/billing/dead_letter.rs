//! Failed reconciliation record.

use serde::{Deserialize, Serialize};

use super::{ReconcileError, StripeEvent};
use crate::domain::foundation::{EventId, Timestamp};

/// An event whose reconciliation failed, kept for operator inspection.
///
/// At most one entry exists per event; a later failure of the same event
/// replaces the earlier entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetter {
    pub event_id: EventId,
    pub raw_event: StripeEvent,
    pub code: String,
    pub message: String,
    pub when: Timestamp,
}

impl DeadLetter {
    pub fn new(event: &StripeEvent, error: &ReconcileError, when: Timestamp) -> Self {
        Self {
            event_id: event.id.clone(),
            raw_event: event.clone(),
            code: error.code().to_string(),
            message: error.to_string(),
            when,
        }
    }
}
