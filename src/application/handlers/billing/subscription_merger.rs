//! SubscriptionMerger - Monotonic merge of subscription events.
//!
//! Ordering comes from the event's `created`, never from arrival order. An
//! event no newer than the stored record is discarded. The write is the
//! store's conditional merge, so a concurrent newer write still wins even
//! if it lands between the read and the write here.

use std::sync::Arc;

use crate::domain::billing::{ReconcileError, SubscriptionChange, SubscriptionRecord};
use crate::domain::foundation::{AccountId, SubscriptionId};
use crate::ports::{MergeOutcome, SubscriptionStateRepository};

use super::ProductCache;

/// Result of merging one subscription event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeResult {
    Applied {
        account: AccountId,
        subscription: SubscriptionId,
    },
    DiscardedStale {
        account: AccountId,
        subscription: SubscriptionId,
    },
}

pub struct SubscriptionMerger {
    state: Arc<dyn SubscriptionStateRepository>,
    products: Arc<ProductCache>,
}

impl SubscriptionMerger {
    pub fn new(state: Arc<dyn SubscriptionStateRepository>, products: Arc<ProductCache>) -> Self {
        Self { state, products }
    }

    /// Merges `change` into the subscription map of `account`.
    pub async fn merge(
        &self,
        account: &AccountId,
        change: &SubscriptionChange,
    ) -> Result<MergeResult, ReconcileError> {
        let current = self.state.find(account, &change.subscription_id).await?;

        // Fast path: skip the product lookup for events we already know are stale.
        if let Some(current) = &current {
            if !current.is_superseded_by(change.created) {
                return Ok(self.discard(account, change, Some(current.event_date)));
            }
        }

        let product = self.products.ensure(&change.product_id).await?;

        let record = SubscriptionRecord {
            id: change.subscription_id.clone(),
            status: change.status,
            quantity: change.quantity,
            livemode: change.livemode,
            event_date: change.created,
            product,
        };

        match self.state.merge_if_newer(account, &record).await? {
            MergeOutcome::Applied => {
                tracing::info!(
                    account_id = %account,
                    subscription_id = %change.subscription_id,
                    status = change.status.as_str(),
                    event_date = change.created,
                    product_id = %change.product_id,
                    "Merged subscription change"
                );
                Ok(MergeResult::Applied {
                    account: account.clone(),
                    subscription: change.subscription_id.clone(),
                })
            }
            MergeOutcome::Stale => Ok(self.discard(account, change, None)),
        }
    }

    fn discard(
        &self,
        account: &AccountId,
        change: &SubscriptionChange,
        stored_event_date: Option<i64>,
    ) -> MergeResult {
        tracing::info!(
            account_id = %account,
            subscription_id = %change.subscription_id,
            event_date = change.created,
            stored_event_date = ?stored_event_date,
            "Discarded stale subscription change"
        );
        MergeResult::DiscardedStale {
            account: account.clone(),
            subscription: change.subscription_id.clone(),
        }
    }
}
