//! Stripe API client.
//!
//! Implements `ProductCatalog` and `EventSource` over Stripe's REST API
//! using the secret key as basic-auth username.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key);
//! let client = StripeClient::new(config);
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::billing::StripeEvent;
use crate::domain::foundation::{EventId, ProductId};
use crate::ports::{
    EventListQuery, EventPage, EventSource, ProductCatalog, UpstreamError, UpstreamErrorCode,
    UpstreamProduct,
};

/// Default Stripe API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,
}

impl StripeConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Stripe list envelope.
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Stripe REST client.
pub struct StripeClient {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<reqwest::Response, UpstreamError> {
        let url = format!("{}{}", self.config.api_base_url, path);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .query(query)
            .send()
            .await
            .map_err(|e| UpstreamError::network(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, path = %path, "Stripe API request failed");
        Err(error_from_response(status, &body))
    }
}

/// Maps a non-success Stripe response onto an `UpstreamError`.
fn error_from_response(status: reqwest::StatusCode, body: &str) -> UpstreamError {
    let code = match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            UpstreamErrorCode::AuthenticationError
        }
        reqwest::StatusCode::NOT_FOUND => UpstreamErrorCode::NotFound,
        reqwest::StatusCode::TOO_MANY_REQUESTS => UpstreamErrorCode::RateLimitExceeded,
        _ => UpstreamErrorCode::ProviderError,
    };

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = envelope
                .error
                .message
                .unwrap_or_else(|| format!("Stripe API error ({})", status));
            let error = UpstreamError::new(code, message);
            match envelope.error.code {
                Some(provider_code) => error.with_provider_code(provider_code),
                None => error,
            }
        }
        Err(_) => UpstreamError::new(code, format!("Stripe API error ({}): {}", status, body)),
    }
}

/// Builds the query string pairs for one events.list page.
fn events_query(query: &EventListQuery) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = query
        .types
        .iter()
        .map(|t| ("types[]".to_string(), t.clone()))
        .collect();
    pairs.push(("limit".to_string(), query.limit.to_string()));
    if let Some(cursor) = &query.starting_after {
        pairs.push(("starting_after".to_string(), cursor.to_string()));
    }
    pairs
}

fn invalid_response(e: impl std::fmt::Display) -> UpstreamError {
    UpstreamError::new(
        UpstreamErrorCode::InvalidResponse,
        format!("Failed to parse Stripe response: {}", e),
    )
}

#[async_trait]
impl ProductCatalog for StripeClient {
    async fn retrieve_product(&self, product: &ProductId) -> Result<UpstreamProduct, UpstreamError> {
        let response = self
            .get(&format!("/v1/products/{}", product), &[])
            .await?;
        response.json().await.map_err(invalid_response)
    }
}

#[async_trait]
impl EventSource for StripeClient {
    async fn list_events(&self, query: &EventListQuery) -> Result<EventPage, UpstreamError> {
        let response = self.get("/v1/events", &events_query(query)).await?;
        let list: ListResponse = response.json().await.map_err(invalid_response)?;

        let data = list
            .data
            .into_iter()
            .map(|value| StripeEvent::from_value(value).map_err(invalid_response))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EventPage {
            data,
            has_more: list.has_more,
        })
    }

    async fn retrieve_event(&self, event_id: &EventId) -> Result<StripeEvent, UpstreamError> {
        let response = self.get(&format!("/v1/events/{}", event_id), &[]).await?;
        let value: Value = response.json().await.map_err(invalid_response)?;
        StripeEvent::from_value(value).map_err(invalid_response)
    }
}
