//! EntitlementCache port - Best-effort read-through cache.
//!
//! Never a source of truth. Callers must behave correctly when every lookup
//! misses.

use async_trait::async_trait;

use crate::domain::billing::Entitlement;
use crate::domain::foundation::AccountId;

/// Cache key for one entitlement query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntitlementKey {
    pub account: AccountId,
    pub include_testing: bool,
}

#[async_trait]
pub trait EntitlementCache: Send + Sync {
    async fn get(&self, key: &EntitlementKey) -> Option<Entitlement>;

    async fn put(&self, key: EntitlementKey, value: Entitlement);
}
