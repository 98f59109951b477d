//! GetEntitlementsHandler - Query handler for an account's entitlements.

use std::sync::Arc;

use crate::domain::billing::{calculate_entitlements, Entitlement, ReconcileError};
use crate::domain::foundation::AccountId;
use crate::ports::{EntitlementCache, EntitlementKey, SubscriptionStateRepository};

/// Query for the entitlements of one account.
#[derive(Debug, Clone)]
pub struct GetEntitlementsQuery {
    pub account: AccountId,
    /// Count test-mode subscriptions and products too.
    pub include_testing: bool,
}

/// Reads subscription state and derives the entitlement, through the cache.
pub struct GetEntitlementsHandler {
    state: Arc<dyn SubscriptionStateRepository>,
    cache: Arc<dyn EntitlementCache>,
}

impl GetEntitlementsHandler {
    pub fn new(state: Arc<dyn SubscriptionStateRepository>, cache: Arc<dyn EntitlementCache>) -> Self {
        Self { state, cache }
    }

    pub async fn handle(&self, query: GetEntitlementsQuery) -> Result<Entitlement, ReconcileError> {
        let key = EntitlementKey {
            account: query.account.clone(),
            include_testing: query.include_testing,
        };

        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let subscriptions = self.state.list_for_account(&query.account).await?;
        let entitlement = calculate_entitlements(&subscriptions, query.include_testing);

        self.cache.put(key, entitlement.clone()).await;
        Ok(entitlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::{DisabledEntitlementCache, TtlEntitlementCache};
    use crate::adapters::memory::InMemorySubscriptionState;
    use crate::domain::billing::{ProductSnapshot, ProductTier, SubscriptionRecord, SubscriptionStatus};
    use crate::domain::foundation::{ProductId, SubscriptionId, Timestamp};
    use std::time::Duration;

    fn record(id: &str, code: &str, event_date: i64) -> SubscriptionRecord {
        SubscriptionRecord {
            id: SubscriptionId::new(id).unwrap(),
            status: SubscriptionStatus::Active,
            quantity: 7,
            livemode: true,
            event_date,
            product: ProductSnapshot {
                product_id: ProductId::new("prod_1").unwrap(),
                code: Some(code.to_string()),
                name: code.to_uppercase(),
                description: None,
                livemode: true,
                updated_at: Timestamp::from_unix_secs(0),
            },
        }
    }

    fn query() -> GetEntitlementsQuery {
        GetEntitlementsQuery {
            account: AccountId::new("acct_1").unwrap(),
            include_testing: false,
        }
    }

    #[tokio::test]
    async fn account_without_state_is_free() {
        let handler = GetEntitlementsHandler::new(
            Arc::new(InMemorySubscriptionState::new()),
            Arc::new(DisabledEntitlementCache),
        );
        assert_eq!(handler.handle(query()).await.unwrap(), Entitlement::free());
    }

    #[tokio::test]
    async fn derives_from_stored_subscriptions() {
        let state = Arc::new(InMemorySubscriptionState::new());
        let account = AccountId::new("acct_1").unwrap();
        state.merge_if_newer(&account, &record("sub_1", "standard", 10)).await.unwrap();
        state.merge_if_newer(&account, &record("sub_2", "enterprise", 20)).await.unwrap();

        let handler = GetEntitlementsHandler::new(state, Arc::new(DisabledEntitlementCache));
        let entitlement = handler.handle(query()).await.unwrap();

        assert_eq!(entitlement.license, ProductTier::Enterprise);
        assert_eq!(entitlement.seats, 7);
    }

    #[tokio::test]
    async fn cached_result_is_served_within_ttl() {
        let state = Arc::new(InMemorySubscriptionState::new());
        let account = AccountId::new("acct_1").unwrap();
        let handler = GetEntitlementsHandler::new(
            state.clone(),
            Arc::new(TtlEntitlementCache::new(Duration::from_secs(10))),
        );

        assert_eq!(handler.handle(query()).await.unwrap(), Entitlement::free());
        state.merge_if_newer(&account, &record("sub_1", "pro", 10)).await.unwrap();

        // Still the cached answer until the entry expires.
        assert_eq!(handler.handle(query()).await.unwrap(), Entitlement::free());
    }

    #[tokio::test]
    async fn disabled_cache_sees_writes_immediately() {
        let state = Arc::new(InMemorySubscriptionState::new());
        let account = AccountId::new("acct_1").unwrap();
        let handler = GetEntitlementsHandler::new(state.clone(), Arc::new(DisabledEntitlementCache));

        handler.handle(query()).await.unwrap();
        state.merge_if_newer(&account, &record("sub_1", "pro", 10)).await.unwrap();

        assert_eq!(handler.handle(query()).await.unwrap().license, ProductTier::Pro);
    }
}
