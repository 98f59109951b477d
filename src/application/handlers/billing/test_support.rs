//! In-memory wiring of the billing handlers for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::json;

use super::*;
use crate::adapters::memory::{
    InMemoryCustomerAccounts, InMemoryDeadLetters, InMemoryEventLog, InMemoryProductSnapshots,
    InMemorySubscriptionState, ManualClock,
};
use crate::adapters::stripe::{signature_header_for, StripeSignatureVerifier};
use crate::domain::billing::{StripeEvent, StripeEventBuilder};
use crate::domain::foundation::{EventId, ProductId, Timestamp};
use crate::ports::{
    EventListQuery, EventPage, EventSource, ProductCatalog, UpstreamError, UpstreamProduct,
};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const NOW: i64 = 1_700_000_000;

/// Product catalog keyed by product id, returning `metadata.product-code`.
#[derive(Default)]
pub struct StubCatalog {
    codes: Mutex<HashMap<String, String>>,
    pub calls: Mutex<usize>,
}

impl StubCatalog {
    pub fn with_product(self, product: &str, code: &str) -> Self {
        self.codes
            .lock()
            .unwrap()
            .insert(product.to_string(), code.to_string());
        self
    }
}

#[async_trait]
impl ProductCatalog for StubCatalog {
    async fn retrieve_product(&self, product: &ProductId) -> Result<UpstreamProduct, UpstreamError> {
        *self.calls.lock().unwrap() += 1;
        let code = self
            .codes
            .lock()
            .unwrap()
            .get(product.as_str())
            .cloned()
            .ok_or_else(|| UpstreamError::not_found("product", product.as_str()))?;
        Ok(UpstreamProduct {
            id: product.to_string(),
            name: code.to_uppercase(),
            description: None,
            livemode: true,
            metadata: HashMap::from([("product-code".to_string(), code)]),
        })
    }
}

/// Event source serving a fixed history, newest first, in pages.
#[derive(Default)]
pub struct StubEventSource {
    events: Vec<StripeEvent>,
    pub queries: Mutex<Vec<EventListQuery>>,
}

impl StubEventSource {
    pub fn new(mut events: Vec<StripeEvent>) -> Self {
        events.sort_by_key(|e| std::cmp::Reverse(e.created));
        Self {
            events,
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl EventSource for StubEventSource {
    async fn list_events(&self, query: &EventListQuery) -> Result<EventPage, UpstreamError> {
        self.queries.lock().unwrap().push(query.clone());
        let start = match &query.starting_after {
            Some(cursor) => self
                .events
                .iter()
                .position(|e| &e.id == cursor)
                .map_or(self.events.len(), |i| i + 1),
            None => 0,
        };
        let end = (start + query.limit as usize).min(self.events.len());
        Ok(EventPage {
            data: self.events[start..end].to_vec(),
            has_more: end < self.events.len(),
        })
    }

    async fn retrieve_event(&self, event_id: &EventId) -> Result<StripeEvent, UpstreamError> {
        self.events
            .iter()
            .find(|e| &e.id == event_id)
            .cloned()
            .ok_or_else(|| UpstreamError::not_found("event", event_id.as_str()))
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub event_log: Arc<InMemoryEventLog>,
    pub accounts: Arc<InMemoryCustomerAccounts>,
    pub state: Arc<InMemorySubscriptionState>,
    pub dead_letters: Arc<InMemoryDeadLetters>,
    pub catalog: Arc<StubCatalog>,
    pub identity: Arc<IdentityMapper>,
    pub reconciler: Arc<EventReconciler>,
    pub ingest: Arc<IngestWebhookHandler>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_catalog(
            StubCatalog::default()
                .with_product("prod_standard", "standard")
                .with_product("prod_pro", "pro")
                .with_product("prod_enterprise", "enterprise"),
        )
    }

    pub fn with_catalog(catalog: StubCatalog) -> Self {
        let clock = Arc::new(ManualClock::at(Timestamp::from_unix_secs(NOW)));
        let event_log = Arc::new(InMemoryEventLog::new());
        let accounts = Arc::new(InMemoryCustomerAccounts::new());
        let state = Arc::new(InMemorySubscriptionState::new());
        let dead_letters = Arc::new(InMemoryDeadLetters::new());
        let catalog = Arc::new(catalog);

        let identity = Arc::new(IdentityMapper::new(accounts.clone()));
        let products = Arc::new(ProductCache::new(
            Arc::new(InMemoryProductSnapshots::new()),
            catalog.clone(),
            clock.clone(),
        ));
        let merger = Arc::new(SubscriptionMerger::new(state.clone(), products));
        let reconciler = Arc::new(EventReconciler::new(
            identity.clone(),
            merger,
            dead_letters.clone(),
            clock.clone(),
        ));
        let verifier = StripeSignatureVerifier::new(SecretString::new(WEBHOOK_SECRET.to_string()))
            .with_clock(clock.clone());
        let ingest = Arc::new(IngestWebhookHandler::new(
            Arc::new(verifier),
            event_log.clone(),
            reconciler.clone(),
        ));

        Self {
            clock,
            event_log,
            accounts,
            state,
            dead_letters,
            catalog,
            identity,
            reconciler,
            ingest,
        }
    }

    /// Serializes and signs `event` as a webhook delivery.
    pub fn signed(&self, event: &StripeEvent) -> IngestWebhookCommand {
        let payload = serde_json::to_vec(event).unwrap();
        let signature = signature_header_for(WEBHOOK_SECRET, NOW, &payload);
        IngestWebhookCommand { payload, signature }
    }
}

pub fn checkout(id: &str, created: i64, customer: &str, account: &str) -> StripeEvent {
    StripeEventBuilder::new()
        .id(id)
        .created(created)
        .object(json!({
            "object": "checkout.session",
            "customer": customer,
            "client_reference_id": account
        }))
        .build()
}

pub fn subscription(
    id: &str,
    created: i64,
    event_type: &str,
    subscription: &str,
    customer: &str,
    status: &str,
    product: &str,
) -> StripeEvent {
    StripeEventBuilder::new()
        .id(id)
        .created(created)
        .subscription(event_type, subscription, customer, status, product)
        .build()
}
