//! SubscriptionStateRepository port - Per-account subscription map.
//!
//! Each subscription of an account is stored as its own entry so sibling
//! subscriptions are never overwritten by a merge. The merge itself is a
//! single conditional write: the record is stored only if no newer or
//! equally new record exists for the same subscription. That condition is
//! evaluated atomically by the store, so two concurrent events for one
//! subscription cannot lose an update.

use async_trait::async_trait;

use super::StoreError;
use crate::domain::billing::SubscriptionRecord;
use crate::domain::foundation::{AccountId, SubscriptionId};

/// Outcome of a conditional merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Record was written.
    Applied,
    /// Stored record was at least as new; nothing was written.
    Stale,
}

/// Port for account subscription state.
#[async_trait]
pub trait SubscriptionStateRepository: Send + Sync {
    /// Finds one subscription record of an account.
    async fn find(
        &self,
        account: &AccountId,
        subscription: &SubscriptionId,
    ) -> Result<Option<SubscriptionRecord>, StoreError>;

    /// Lists all subscription records of an account, oldest event first.
    async fn list_for_account(
        &self,
        account: &AccountId,
    ) -> Result<Vec<SubscriptionRecord>, StoreError>;

    /// Atomically writes `record` iff the stored record for the same
    /// `(account, record.id)` is absent or has an older `event_date`.
    async fn merge_if_newer(
        &self,
        account: &AccountId,
        record: &SubscriptionRecord,
    ) -> Result<MergeOutcome, StoreError>;
}
