//! Stripe adapters.
//!
//! - `StripeSignatureVerifier` - webhook signature check (HMAC-SHA256)
//! - `StripeClient` - product retrieval and event history over the REST API

mod client;
mod signature;

pub use client::{StripeClient, StripeConfig, DEFAULT_API_BASE_URL};
pub use signature::{
    signature_header_for, SignatureHeader, SignatureParseError, StripeSignatureVerifier,
    DEFAULT_TOLERANCE_SECS,
};
