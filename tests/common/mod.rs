//! Shared wiring for integration tests: in-memory stores, stub Stripe.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::json;

use entitlement_reconciler::adapters::cache::DisabledEntitlementCache;
use entitlement_reconciler::adapters::memory::{
    InMemoryCustomerAccounts, InMemoryDeadLetters, InMemoryEventLog, InMemoryProductSnapshots,
    InMemorySubscriptionState, ManualClock,
};
use entitlement_reconciler::adapters::stripe::{signature_header_for, StripeSignatureVerifier};
use entitlement_reconciler::application::handlers::billing::{
    BackfillAccountHandler, EventReconciler, GetEntitlementsHandler, IdentityMapper,
    IngestWebhookCommand, IngestWebhookHandler, ListDeadLettersHandler, ProductCache,
    RecoverEventHandler, ReplayEventsHandler, SubscriptionMerger,
};
use entitlement_reconciler::domain::billing::StripeEvent;
use entitlement_reconciler::domain::foundation::{EventId, ProductId, Timestamp};
use entitlement_reconciler::ports::{
    EntitlementCache, EventListQuery, EventPage, EventSource, ProductCatalog, UpstreamError,
    UpstreamProduct,
};

pub const WEBHOOK_SECRET: &str = "whsec_integration";
pub const NOW: i64 = 1_700_000_000;

pub const CREATED: &str = "customer.subscription.created";
pub const UPDATED: &str = "customer.subscription.updated";
pub const DELETED: &str = "customer.subscription.deleted";

// =============================================================================
// Stub Stripe
// =============================================================================

/// Product catalog with per-product codes and a fetch counter.
pub struct StubCatalog {
    products: Mutex<HashMap<String, (String, bool)>>,
    fetches: AtomicUsize,
}

impl StubCatalog {
    pub fn new() -> Self {
        let catalog = Self {
            products: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
        };
        catalog.put("prod_standard", "standard", true);
        catalog.put("prod_pro", "pro", true);
        catalog.put("prod_enterprise", "enterprise", true);
        catalog.put("prod_pro_test", "pro", false);
        catalog
    }

    pub fn put(&self, product: &str, code: &str, livemode: bool) {
        self.products
            .lock()
            .unwrap()
            .insert(product.to_string(), (code.to_string(), livemode));
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProductCatalog for StubCatalog {
    async fn retrieve_product(&self, product: &ProductId) -> Result<UpstreamProduct, UpstreamError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let (code, livemode) = self
            .products
            .lock()
            .unwrap()
            .get(product.as_str())
            .cloned()
            .ok_or_else(|| UpstreamError::not_found("product", product.as_str()))?;
        Ok(UpstreamProduct {
            id: product.to_string(),
            name: format!("{} plan", code),
            description: None,
            livemode,
            metadata: HashMap::from([("product-code".to_string(), code)]),
        })
    }
}

/// Event history served newest first, paged by `starting_after`.
pub struct StubEventSource {
    events: Vec<StripeEvent>,
    pub pages_served: AtomicUsize,
}

impl StubEventSource {
    pub fn new(mut events: Vec<StripeEvent>) -> Self {
        events.sort_by_key(|e| std::cmp::Reverse(e.created));
        Self {
            events,
            pages_served: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EventSource for StubEventSource {
    async fn list_events(&self, query: &EventListQuery) -> Result<EventPage, UpstreamError> {
        self.pages_served.fetch_add(1, Ordering::SeqCst);
        let matching: Vec<&StripeEvent> = self
            .events
            .iter()
            .filter(|e| query.types.is_empty() || query.types.contains(&e.event_type))
            .collect();
        let start = match &query.starting_after {
            Some(cursor) => matching
                .iter()
                .position(|e| &e.id == cursor)
                .map_or(matching.len(), |i| i + 1),
            None => 0,
        };
        let end = (start + query.limit as usize).min(matching.len());
        Ok(EventPage {
            data: matching[start..end].iter().map(|e| (*e).clone()).collect(),
            has_more: end < matching.len(),
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

// =============================================================================
// Wiring
// =============================================================================

pub struct TestApp {
    pub clock: Arc<ManualClock>,
    pub event_log: Arc<InMemoryEventLog>,
    pub accounts: Arc<InMemoryCustomerAccounts>,
    pub state: Arc<InMemorySubscriptionState>,
    pub snapshots: Arc<InMemoryProductSnapshots>,
    pub dead_letters: Arc<InMemoryDeadLetters>,
    pub catalog: Arc<StubCatalog>,
    pub source: Arc<StubEventSource>,
    pub identity: Arc<IdentityMapper>,
    pub reconciler: Arc<EventReconciler>,
    pub ingest: Arc<IngestWebhookHandler>,
    pub entitlements: Arc<GetEntitlementsHandler>,
    pub replay: Arc<ReplayEventsHandler>,
    pub backfill: Arc<BackfillAccountHandler>,
    pub recover: Arc<RecoverEventHandler>,
    pub list_dead_letters: Arc<ListDeadLettersHandler>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_history(Vec::new())
    }

    /// Wires every handler over in-memory stores; `history` backs the event source.
    pub fn with_history(history: Vec<StripeEvent>) -> Self {
        let clock = Arc::new(ManualClock::at(Timestamp::from_unix_secs(NOW)));
        let event_log = Arc::new(InMemoryEventLog::new());
        let accounts = Arc::new(InMemoryCustomerAccounts::new());
        let state = Arc::new(InMemorySubscriptionState::new());
        let snapshots = Arc::new(InMemoryProductSnapshots::new());
        let dead_letters = Arc::new(InMemoryDeadLetters::new());
        let catalog = Arc::new(StubCatalog::new());
        let source = Arc::new(StubEventSource::new(history));

        let identity = Arc::new(IdentityMapper::new(accounts.clone()));
        let products = Arc::new(ProductCache::new(snapshots.clone(), catalog.clone(), clock.clone()));
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
        let cache: Arc<dyn EntitlementCache> = Arc::new(DisabledEntitlementCache);

        Self {
            entitlements: Arc::new(GetEntitlementsHandler::new(state.clone(), cache)),
            replay: Arc::new(ReplayEventsHandler::new(event_log.clone(), reconciler.clone())),
            backfill: Arc::new(
                BackfillAccountHandler::new(
                    source.clone(),
                    ingest.clone(),
                    identity.clone(),
                    state.clone(),
                )
                .with_page_size(2),
            ),
            recover: Arc::new(RecoverEventHandler::new(source.clone(), ingest.clone())),
            list_dead_letters: Arc::new(ListDeadLettersHandler::new(dead_letters.clone())),
            clock,
            event_log,
            accounts,
            state,
            snapshots,
            dead_letters,
            catalog,
            source,
            identity,
            reconciler,
            ingest,
        }
    }

    /// Signs `event` the way Stripe would deliver it now.
    pub fn delivery(&self, event: &StripeEvent) -> IngestWebhookCommand {
        let payload = serde_json::to_vec(event).unwrap();
        let signature = signature_header_for(WEBHOOK_SECRET, NOW, &payload);
        IngestWebhookCommand { payload, signature }
    }
}

// =============================================================================
// Event fixtures
// =============================================================================

pub fn checkout(id: &str, created: i64, customer: &str, account: &str) -> StripeEvent {
    StripeEvent::from_value(json!({
        "id": id,
        "object": "event",
        "type": "checkout.session.completed",
        "created": created,
        "livemode": true,
        "data": {
            "object": {
                "id": format!("cs_{}", id),
                "object": "checkout.session",
                "customer": customer,
                "client_reference_id": account
            }
        }
    }))
    .unwrap()
}

#[allow(clippy::too_many_arguments)]
pub fn subscription_event(
    id: &str,
    created: i64,
    event_type: &str,
    subscription: &str,
    customer: &str,
    status: &str,
    product: &str,
    quantity: u32,
) -> StripeEvent {
    StripeEvent::from_value(json!({
        "id": id,
        "object": "event",
        "type": event_type,
        "created": created,
        "livemode": true,
        "data": {
            "object": {
                "id": subscription,
                "object": "subscription",
                "customer": customer,
                "status": status,
                "quantity": quantity,
                "livemode": true,
                "plan": { "id": "price_1", "product": product }
            }
        }
    }))
    .unwrap()
}
