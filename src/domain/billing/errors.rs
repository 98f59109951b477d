//! Reconciliation error taxonomy.
//!
//! Every failure the pipeline can produce maps onto one of these variants,
//! with HTTP status code mapping and retryability semantics.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{CustomerId, EventId, ValidationError};

/// Errors that occur while ingesting or reconciling an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Signature header missing, malformed, expired, or not matching.
    #[error("Invalid signature: {0}")]
    SignatureInvalid(String),

    /// Payload is not a usable Stripe event, or lacks a required field.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Subscription event for a customer with no established account.
    #[error("Account not found for customer {customer}")]
    IdentityNotFound { customer: CustomerId },

    /// Subscription-family event type this system does not understand.
    #[error("Unknown subscription event type: {event_type} for event {event_id}")]
    UnknownEventType { event_type: String, event_id: EventId },

    /// Upstream Stripe call failed.
    #[error("Upstream fetch failed: {0}")]
    UpstreamFetchFailed(String),

    /// Backing store could not be read or written.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ReconcileError {
    /// Returns true if the same operation may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReconcileError::UpstreamFetchFailed(_) | ReconcileError::StoreUnavailable(_)
        )
    }

    /// Maps the error to an HTTP status code.
    ///
    /// Stripe retries on 5xx and gives up on 4xx.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReconcileError::SignatureInvalid(_) | ReconcileError::MalformedPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            ReconcileError::IdentityNotFound { .. } | ReconcileError::UnknownEventType { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ReconcileError::UpstreamFetchFailed(_) => StatusCode::BAD_GATEWAY,
            ReconcileError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ReconcileError::SignatureInvalid(_) => "SIGNATURE_INVALID",
            ReconcileError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            ReconcileError::IdentityNotFound { .. } => "IDENTITY_NOT_FOUND",
            ReconcileError::UnknownEventType { .. } => "UNKNOWN_EVENT_TYPE",
            ReconcileError::UpstreamFetchFailed(_) => "UPSTREAM_FETCH_FAILED",
            ReconcileError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Creates a malformed payload error for a missing field.
    pub fn missing_field(path: &str) -> Self {
        ReconcileError::MalformedPayload(format!("missing field {}", path))
    }
}

impl From<ValidationError> for ReconcileError {
    fn from(err: ValidationError) -> Self {
        ReconcileError::MalformedPayload(err.to_string())
    }
}
