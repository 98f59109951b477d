//! In-memory implementations of the store ports.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::billing::{CustomerAccountMapping, DeadLetter, ProductSnapshot, StripeEvent, SubscriptionRecord};
use crate::domain::foundation::{AccountId, CustomerId, EventId, ProductId, SubscriptionId};
use crate::ports::{
    CustomerAccountRepository, DeadLetterStore, EventLog, MergeOutcome, ProductSnapshotRepository,
    SaveResult, StoreError, SubscriptionStateRepository,
};

// ════════════════════════════════════════════════════════════════════════════════
// Event Log
// ════════════════════════════════════════════════════════════════════════════════

/// In-memory event log.
///
/// Can be switched into a failing mode to exercise store outages.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: RwLock<HashMap<EventId, StripeEvent>>,
    unavailable: AtomicBool,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("event log offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn record(&self, event: &StripeEvent) -> Result<SaveResult, StoreError> {
        self.check_available()?;
        let mut events = self.events.write().await;
        if events.contains_key(&event.id) {
            return Ok(SaveResult::AlreadyExists);
        }
        events.insert(event.id.clone(), event.clone());
        Ok(SaveResult::Inserted)
    }

    async fn find(&self, event_id: &EventId) -> Result<Option<StripeEvent>, StoreError> {
        self.check_available()?;
        Ok(self.events.read().await.get(event_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<StripeEvent>, StoreError> {
        self.check_available()?;
        Ok(self.events.read().await.values().cloned().collect())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Customer Accounts
// ════════════════════════════════════════════════════════════════════════════════

/// In-memory customer to account mappings.
#[derive(Debug, Default)]
pub struct InMemoryCustomerAccounts {
    mappings: RwLock<HashMap<CustomerId, CustomerAccountMapping>>,
}

impl InMemoryCustomerAccounts {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerAccountRepository for InMemoryCustomerAccounts {
    async fn insert_if_absent(
        &self,
        mapping: &CustomerAccountMapping,
    ) -> Result<SaveResult, StoreError> {
        let mut mappings = self.mappings.write().await;
        if mappings.contains_key(&mapping.customer) {
            return Ok(SaveResult::AlreadyExists);
        }
        mappings.insert(mapping.customer.clone(), mapping.clone());
        Ok(SaveResult::Inserted)
    }

    async fn find_account(&self, customer: &CustomerId) -> Result<Option<AccountId>, StoreError> {
        Ok(self
            .mappings
            .read()
            .await
            .get(customer)
            .map(|m| m.account.clone()))
    }

    async fn find_customers(&self, account: &AccountId) -> Result<Vec<CustomerId>, StoreError> {
        let mut customers: Vec<CustomerId> = self
            .mappings
            .read()
            .await
            .values()
            .filter(|m| &m.account == account)
            .map(|m| m.customer.clone())
            .collect();
        customers.sort();
        Ok(customers)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscription State
// ════════════════════════════════════════════════════════════════════════════════

/// In-memory account subscription maps.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionState {
    accounts: RwLock<HashMap<AccountId, HashMap<SubscriptionId, SubscriptionRecord>>>,
}

impl InMemorySubscriptionState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStateRepository for InMemorySubscriptionState {
    async fn find(
        &self,
        account: &AccountId,
        subscription: &SubscriptionId,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        Ok(self
            .accounts
            .read()
            .await
            .get(account)
            .and_then(|subs| subs.get(subscription))
            .cloned())
    }

    async fn list_for_account(
        &self,
        account: &AccountId,
    ) -> Result<Vec<SubscriptionRecord>, StoreError> {
        let mut records: Vec<SubscriptionRecord> = self
            .accounts
            .read()
            .await
            .get(account)
            .map(|subs| subs.values().cloned().collect())
            .unwrap_or_default();
        records.sort_by(|a, b| a.event_date.cmp(&b.event_date).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn merge_if_newer(
        &self,
        account: &AccountId,
        record: &SubscriptionRecord,
    ) -> Result<MergeOutcome, StoreError> {
        let mut accounts = self.accounts.write().await;
        let subscriptions = accounts.entry(account.clone()).or_default();
        match subscriptions.get(&record.id) {
            Some(current) if !current.is_superseded_by(record.event_date) => Ok(MergeOutcome::Stale),
            _ => {
                subscriptions.insert(record.id.clone(), record.clone());
                Ok(MergeOutcome::Applied)
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Product Snapshots
// ════════════════════════════════════════════════════════════════════════════════

/// In-memory product snapshots.
#[derive(Debug, Default)]
pub struct InMemoryProductSnapshots {
    products: RwLock<HashMap<ProductId, ProductSnapshot>>,
}

impl InMemoryProductSnapshots {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductSnapshotRepository for InMemoryProductSnapshots {
    async fn find(&self, product: &ProductId) -> Result<Option<ProductSnapshot>, StoreError> {
        Ok(self.products.read().await.get(product).cloned())
    }

    async fn save(&self, snapshot: &ProductSnapshot) -> Result<(), StoreError> {
        self.products
            .write()
            .await
            .insert(snapshot.product_id.clone(), snapshot.clone());
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Dead Letters
// ════════════════════════════════════════════════════════════════════════════════

/// In-memory dead-letter store.
#[derive(Debug, Default)]
pub struct InMemoryDeadLetters {
    letters: RwLock<HashMap<EventId, DeadLetter>>,
}

impl InMemoryDeadLetters {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeadLetterStore for InMemoryDeadLetters {
    async fn record(&self, letter: &DeadLetter) -> Result<(), StoreError> {
        self.letters
            .write()
            .await
            .insert(letter.event_id.clone(), letter.clone());
        Ok(())
    }

    async fn find(&self, event_id: &EventId) -> Result<Option<DeadLetter>, StoreError> {
        Ok(self.letters.read().await.get(event_id).cloned())
    }

    async fn list(&self) -> Result<Vec<DeadLetter>, StoreError> {
        let mut letters: Vec<DeadLetter> = self.letters.read().await.values().cloned().collect();
        letters.sort_by(|a, b| b.when.cmp(&a.when).then_with(|| a.event_id.cmp(&b.event_id)));
        Ok(letters)
    }
}
