//! Stripe webhook signature verification.
//!
//! Stripe signs `"{t}.{body}"` with HMAC-SHA256 using the endpoint secret and
//! sends the result in the `Stripe-Signature` header as
//! `t=<unix>,v1=<hex>[,v1=<hex>...][,v0=<hex>]`. During secret rotation more
//! than one `v1` entry is present; any match is accepted.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::domain::billing::ReconcileError;
use crate::ports::{Clock, SignatureVerifier, SystemClock};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

// ════════════════════════════════════════════════════════════════════════════════
// Signature Parsing
// ════════════════════════════════════════════════════════════════════════════════

/// Error parsing the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureParseError {
    #[error("Missing Stripe-Signature header")]
    MissingHeader,

    #[error("Missing timestamp (t=) in signature")]
    MissingTimestamp,

    #[error("Missing v1 signature in header")]
    MissingV1Signature,

    #[error("Invalid timestamp format")]
    InvalidTimestamp,

    #[error("Invalid signature format (not valid hex)")]
    InvalidSignatureFormat,
}

/// Parsed Stripe-Signature header components.
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    /// Unix timestamp when Stripe signed the payload.
    pub timestamp: i64,

    /// Every v1 signature present (HMAC-SHA256, decoded from hex).
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parse a Stripe-Signature header into components.
    ///
    /// Unknown keys, including the legacy `v0`, are skipped.
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        if header.trim().is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };

            match key.trim() {
                "t" => {
                    timestamp = Some(
                        value
                            .trim()
                            .parse()
                            .map_err(|_| SignatureParseError::InvalidTimestamp)?,
                    );
                }
                "v1" => {
                    v1_signatures.push(
                        hex::decode(value.trim())
                            .map_err(|_| SignatureParseError::InvalidSignatureFormat)?,
                    );
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureParseError::MissingTimestamp)?;
        if v1_signatures.is_empty() {
            return Err(SignatureParseError::MissingV1Signature);
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

fn compute_signature(secret: &[u8], timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, ReconcileError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| ReconcileError::SignatureInvalid(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Builds a `Stripe-Signature` header value for `payload`, as Stripe would.
///
/// Used to sign fixtures and by local tooling that replays captured bodies.
pub fn signature_header_for(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let signature = compute_signature(secret.as_bytes(), timestamp, payload).unwrap_or_default();
    format!("t={},v1={}", timestamp, hex::encode(&signature))
}

// ════════════════════════════════════════════════════════════════════════════════
// Verifier
// ════════════════════════════════════════════════════════════════════════════════

/// Verifies webhook bodies against the endpoint signing secret.
pub struct StripeSignatureVerifier {
    secret: SecretString,
    tolerance_secs: i64,
    clock: Arc<dyn Clock>,
}

impl StripeSignatureVerifier {
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
            clock: Arc::new(SystemClock),
        }
    }

    /// Overrides the maximum accepted signature age.
    pub fn with_tolerance_secs(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl SignatureVerifier for StripeSignatureVerifier {
    fn verify(&self, payload: &[u8], signature_header: &str) -> Result<(), ReconcileError> {
        let header = SignatureHeader::parse(signature_header)
            .map_err(|e| ReconcileError::SignatureInvalid(e.to_string()))?;

        let now = self.clock.now().as_unix_secs();
        let age = now.checked_sub(header.timestamp).ok_or_else(|| {
            ReconcileError::SignatureInvalid("signature timestamp out of range".to_string())
        })?;

        if age > self.tolerance_secs {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                age_secs = age,
                "Webhook signature too old - possible replay attack"
            );
            return Err(ReconcileError::SignatureInvalid(format!(
                "signature too old ({} seconds)",
                age
            )));
        }

        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook signature from the future - clock skew or manipulation"
            );
            return Err(ReconcileError::SignatureInvalid(
                "signature timestamp in future".to_string(),
            ));
        }

        let expected = compute_signature(
            self.secret.expose_secret().as_bytes(),
            header.timestamp,
            payload,
        )?;

        let matched = header
            .v1_signatures
            .iter()
            .any(|provided| expected.as_slice().ct_eq(provided.as_slice()).unwrap_u8() == 1);

        if !matched {
            tracing::warn!("Webhook signature mismatch");
            return Err(ReconcileError::SignatureInvalid(
                "no matching v1 signature".to_string(),
            ));
        }

        Ok(())
    }
}
