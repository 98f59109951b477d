//! Error type for calls to the Stripe API.

use std::fmt;

use crate::domain::billing::ReconcileError;

/// Failure talking to Stripe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamError {
    pub code: UpstreamErrorCode,
    pub message: String,
    /// Stripe's own error code, when the response carried one.
    pub provider_code: Option<String>,
}

impl UpstreamError {
    pub fn new(code: UpstreamErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorCode::NetworkError, message)
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        Self::new(
            UpstreamErrorCode::NotFound,
            format!("{} {} not found", resource, id),
        )
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for UpstreamError {}

impl From<UpstreamError> for ReconcileError {
    fn from(err: UpstreamError) -> Self {
        ReconcileError::UpstreamFetchFailed(err.to_string())
    }
}

/// Category of upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorCode {
    /// Network connectivity issue.
    NetworkError,
    /// API key rejected.
    AuthenticationError,
    /// Resource not found.
    NotFound,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Response body did not have the expected shape.
    InvalidResponse,
    /// Any other API error.
    ProviderError,
}

impl UpstreamErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UpstreamErrorCode::NetworkError
                | UpstreamErrorCode::RateLimitExceeded
                | UpstreamErrorCode::ProviderError
        )
    }
}

impl fmt::Display for UpstreamErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpstreamErrorCode::NetworkError => "network_error",
            UpstreamErrorCode::AuthenticationError => "authentication_error",
            UpstreamErrorCode::NotFound => "not_found",
            UpstreamErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            UpstreamErrorCode::InvalidResponse => "invalid_response",
            UpstreamErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_code_and_message() {
        let err = UpstreamError::not_found("product", "prod_1");
        assert_eq!(err.to_string(), "not_found: product prod_1 not found");
    }

    #[test]
    fn network_errors_are_retryable() {
        assert!(UpstreamError::network("reset").is_retryable());
        assert!(!UpstreamError::not_found("event", "evt_1").is_retryable());
    }

    #[test]
    fn converts_to_upstream_fetch_failed() {
        let err: ReconcileError = UpstreamError::network("timeout").into();
        assert_eq!(err.code(), "UPSTREAM_FETCH_FAILED");
    }
}
