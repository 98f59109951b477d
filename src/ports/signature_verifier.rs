//! SignatureVerifier port - Webhook authenticity check.

use crate::domain::billing::ReconcileError;

/// Verifies that a webhook body was signed by Stripe.
pub trait SignatureVerifier: Send + Sync {
    /// Checks `signature_header` against the raw body.
    ///
    /// Fails with `ReconcileError::SignatureInvalid` when the header is
    /// malformed, expired, or does not match.
    fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), ReconcileError>;
}
