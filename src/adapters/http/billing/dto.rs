//! HTTP DTOs for reconciliation endpoints.
//!
//! Responses use camelCase to match the entitlement document shape.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::{
    BackfillSummary, IngestResult, ReconcileOutcome, ReplaySummary,
};
use crate::domain::billing::{DeadLetter, StripeEvent};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Query string of the entitlements endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntitlementsParams {
    /// Count test-mode subscriptions and products.
    #[serde(default)]
    pub include_testing: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayResponse {
    pub elapsed_ms: u64,
    pub replayed: usize,
    pub failed: usize,
}

impl From<ReplaySummary> for ReplayResponse {
    fn from(summary: ReplaySummary) -> Self {
        Self {
            elapsed_ms: u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
            replayed: summary.replayed,
            failed: summary.failed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillResponse {
    pub account_id: String,
    pub new_active_subscriptions: usize,
    pub fetched: usize,
    pub replayed: usize,
    pub failed: usize,
}

impl From<BackfillSummary> for BackfillResponse {
    fn from(summary: BackfillSummary) -> Self {
        Self {
            account_id: summary.account.to_string(),
            new_active_subscriptions: summary.new_active_subscriptions,
            fetched: summary.fetched,
            replayed: summary.replayed,
            failed: summary.failed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverResponse {
    pub event_id: String,
    /// What reconciliation did, e.g. `subscription_applied`.
    pub outcome: Option<&'static str>,
    /// The event was already in the log.
    pub duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<IngestResult> for RecoverResponse {
    fn from(result: IngestResult) -> Self {
        let outcome = result.outcome();
        let error = outcome.and_then(|o| match o {
            ReconcileOutcome::DeadLettered { error } => Some(error.to_string()),
            _ => None,
        });
        Self {
            event_id: result.event_id().to_string(),
            outcome: outcome.map(|o| o.label()),
            duplicate: matches!(result, IngestResult::Duplicate { .. }),
            error,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterResponse {
    pub event_id: String,
    pub code: String,
    pub message: String,
    /// RFC 3339
    pub when: String,
    pub raw_event: StripeEvent,
}

impl From<DeadLetter> for DeadLetterResponse {
    fn from(letter: DeadLetter) -> Self {
        Self {
            event_id: letter.event_id.to_string(),
            code: letter.code,
            message: letter.message,
            when: letter.when.as_datetime().to_rfc3339(),
            raw_event: letter.raw_event,
        }
    }
}

/// Standard error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
