//! BackfillAccountHandler - Rebuilds one account from Stripe's event history.
//!
//! Pages the provider's event list, keeps the events that belong to the
//! account, and pushes them oldest first through the ingestion path. The
//! account's set of known customers grows as its checkout events apply.
//! Events skipped because their customer was not yet linked are retried
//! once the set grows, since Stripe can stamp a subscription's first event
//! at or before the checkout that links its customer.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::billing::{
    BillingEvent, ReconcileError, StripeEvent, CHECKOUT_COMPLETED, SUBSCRIPTION_EVENTS,
};
use crate::domain::foundation::{AccountId, CustomerId, SubscriptionId};
use crate::ports::{EventListQuery, EventSource, SubscriptionStateRepository, MAX_PAGE_SIZE};

use super::{DuplicatePolicy, IdentityMapper, IngestWebhookHandler};

/// Summary of an account backfill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillSummary {
    pub account: AccountId,
    /// Events listed by the provider, before account filtering.
    pub fetched: usize,
    /// Events that belonged to the account and were ingested.
    pub replayed: usize,
    /// Replayed events whose reconciliation was dead-lettered.
    pub failed: usize,
    /// Active or trialing subscriptions present after and not before.
    pub new_active_subscriptions: usize,
}

pub struct BackfillAccountHandler {
    source: Arc<dyn EventSource>,
    ingest: Arc<IngestWebhookHandler>,
    identity: Arc<IdentityMapper>,
    state: Arc<dyn SubscriptionStateRepository>,
    page_size: u32,
}

impl BackfillAccountHandler {
    pub fn new(
        source: Arc<dyn EventSource>,
        ingest: Arc<IngestWebhookHandler>,
        identity: Arc<IdentityMapper>,
        state: Arc<dyn SubscriptionStateRepository>,
    ) -> Self {
        Self {
            source,
            ingest,
            identity,
            state,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Sets the list page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub async fn handle(&self, account: &AccountId) -> Result<BackfillSummary, ReconcileError> {
        tracing::warn!(account_id = %account, "Backfilling account from stripe events");

        let active_before = self.active_subscriptions(account).await?;
        let mut events = self.fetch_all().await?;
        let fetched = events.len();
        events.sort_by_key(|event| event.created);

        let mut customers: HashSet<CustomerId> =
            self.identity.customers_for(account).await?.into_iter().collect();
        let mut replayed = 0;
        let mut failed = 0;
        let mut pending = events;

        loop {
            let known = customers.len();
            let mut skipped = Vec::new();
            for event in pending {
                if !belongs_to(&event, account, &customers) {
                    skipped.push(event);
                    continue;
                }
                replayed += 1;
                if !self.replay_one(event, account, &mut customers).await {
                    failed += 1;
                }
            }
            if customers.len() == known || skipped.is_empty() {
                break;
            }
            tracing::debug!(
                account_id = %account,
                retrying = skipped.len(),
                "Customer set grew, retrying skipped events"
            );
            pending = skipped;
        }

        let active_after = self.active_subscriptions(account).await?;
        let summary = BackfillSummary {
            account: account.clone(),
            fetched,
            replayed,
            failed,
            new_active_subscriptions: active_after.difference(&active_before).count(),
        };
        tracing::info!(
            account_id = %account,
            fetched = summary.fetched,
            replayed = summary.replayed,
            failed = summary.failed,
            new_active_subscriptions = summary.new_active_subscriptions,
            "Account backfill complete"
        );
        Ok(summary)
    }

    /// Ingests one event and records any customer it links to `account`.
    /// Returns false when the event was dead-lettered or not recorded.
    async fn replay_one(
        &self,
        event: StripeEvent,
        account: &AccountId,
        customers: &mut HashSet<CustomerId>,
    ) -> bool {
        let event_id = event.id.clone();
        let linked_customer = (event.event_type == CHECKOUT_COMPLETED)
            .then(|| event.customer())
            .flatten();

        let succeeded = match self.ingest.ingest_verified(event, DuplicatePolicy::Reconcile).await {
            Ok(result) => !result.outcome().is_some_and(|o| o.is_failure()),
            Err(e) => {
                tracing::error!(event_id = %event_id, error = %e, "Backfill could not record event");
                false
            }
        };

        if let Some(customer) = linked_customer {
            if self.identity.resolve(&customer).await.ok().as_ref() == Some(account) {
                customers.insert(customer);
            }
        }
        succeeded
    }

    async fn fetch_all(&self) -> Result<Vec<StripeEvent>, ReconcileError> {
        let mut query = EventListQuery {
            types: std::iter::once(CHECKOUT_COMPLETED)
                .chain(SUBSCRIPTION_EVENTS)
                .map(String::from)
                .collect(),
            starting_after: None,
            limit: self.page_size,
        };
        let mut events = Vec::new();

        loop {
            let page = self.source.list_events(&query).await?;
            let Some(last) = page.data.last() else {
                break;
            };
            query.starting_after = Some(last.id.clone());
            let has_more = page.has_more;
            events.extend(page.data);

            tracing::debug!(fetched = events.len(), has_more, "Fetched stripe event page");
            if !has_more {
                break;
            }
        }

        Ok(events)
    }

    async fn active_subscriptions(
        &self,
        account: &AccountId,
    ) -> Result<HashSet<SubscriptionId>, ReconcileError> {
        Ok(self
            .state
            .list_for_account(account)
            .await?
            .into_iter()
            .filter(|record| record.status.is_entitled())
            .map(|record| record.id)
            .collect())
    }
}

/// Whether `event` should be replayed into `account` given the customers
/// linked so far. Subscription events of a customer not yet linked are
/// skipped here and retried by `handle` after the set grows.
fn belongs_to(event: &StripeEvent, account: &AccountId, customers: &HashSet<CustomerId>) -> bool {
    match event.classify() {
        Ok(BillingEvent::CheckoutCompleted(checkout)) => {
            checkout.account.as_ref() == Some(account)
                || checkout.customer.is_some_and(|c| customers.contains(&c))
        }
        // Unparseable subscription events still go through ingestion when the
        // customer is known, so they land in the dead-letter store.
        _ => event.customer().is_some_and(|c| customers.contains(&c)),
    }
}
