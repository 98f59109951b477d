//! EventReconciler - Applies one logged event to identity and subscription state.
//!
//! This is the boundary where reconciliation failures stop. Any error is
//! written to the dead-letter store together with the raw event and reported
//! as `ReconcileOutcome::DeadLettered`; nothing propagates to the caller.

use std::sync::Arc;

use crate::domain::billing::{BillingEvent, DeadLetter, ReconcileError, StripeEvent};
use crate::domain::foundation::{AccountId, CustomerId, SubscriptionId};
use crate::ports::{Clock, DeadLetterStore};

use super::{EstablishResult, IdentityMapper, MergeResult, SubscriptionMerger};

/// What reconciling one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    IdentityEstablished {
        customer: CustomerId,
        account: AccountId,
    },
    /// Checkout event that linked nothing new.
    IdentityUnchanged,
    SubscriptionApplied {
        account: AccountId,
        subscription: SubscriptionId,
    },
    SubscriptionStale {
        account: AccountId,
        subscription: SubscriptionId,
    },
    /// Event type with no effect on reconciled state.
    Ignored,
    /// Reconciliation failed and the event was written to the dead-letter store.
    DeadLettered { error: ReconcileError },
}

impl ReconcileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ReconcileOutcome::DeadLettered { .. })
    }

    /// Short label used in logs and API responses.
    pub fn label(&self) -> &'static str {
        match self {
            ReconcileOutcome::IdentityEstablished { .. } => "identity_established",
            ReconcileOutcome::IdentityUnchanged => "identity_unchanged",
            ReconcileOutcome::SubscriptionApplied { .. } => "subscription_applied",
            ReconcileOutcome::SubscriptionStale { .. } => "subscription_stale",
            ReconcileOutcome::Ignored => "ignored",
            ReconcileOutcome::DeadLettered { .. } => "dead_lettered",
        }
    }
}

pub struct EventReconciler {
    identity: Arc<IdentityMapper>,
    merger: Arc<SubscriptionMerger>,
    dead_letters: Arc<dyn DeadLetterStore>,
    clock: Arc<dyn Clock>,
}

impl EventReconciler {
    pub fn new(
        identity: Arc<IdentityMapper>,
        merger: Arc<SubscriptionMerger>,
        dead_letters: Arc<dyn DeadLetterStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            merger,
            dead_letters,
            clock,
        }
    }

    /// Reconciles `event`, dead-lettering any failure.
    pub async fn reconcile(&self, event: &StripeEvent) -> ReconcileOutcome {
        tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Processing stripe event");

        match self.apply(event).await {
            Ok(outcome) => outcome,
            Err(error) => {
                self.dead_letter(event, &error).await;
                ReconcileOutcome::DeadLettered { error }
            }
        }
    }

    async fn apply(&self, event: &StripeEvent) -> Result<ReconcileOutcome, ReconcileError> {
        match event.classify()? {
            BillingEvent::CheckoutCompleted(checkout) => {
                let (Some(customer), Some(account)) = (checkout.customer, checkout.account) else {
                    return Ok(ReconcileOutcome::IdentityUnchanged);
                };
                match self.identity.establish(&customer, &account, &event.id).await? {
                    EstablishResult::Established => {
                        Ok(ReconcileOutcome::IdentityEstablished { customer, account })
                    }
                    EstablishResult::AlreadyMapped { .. } => Ok(ReconcileOutcome::IdentityUnchanged),
                }
            }
            BillingEvent::SubscriptionChanged(change) => {
                let account = self.identity.resolve(&change.customer).await?;
                match self.merger.merge(&account, &change).await? {
                    MergeResult::Applied {
                        account,
                        subscription,
                    } => Ok(ReconcileOutcome::SubscriptionApplied {
                        account,
                        subscription,
                    }),
                    MergeResult::DiscardedStale {
                        account,
                        subscription,
                    } => Ok(ReconcileOutcome::SubscriptionStale {
                        account,
                        subscription,
                    }),
                }
            }
            BillingEvent::Other => Ok(ReconcileOutcome::Ignored),
        }
    }

    async fn dead_letter(&self, event: &StripeEvent, error: &ReconcileError) {
        let letter = DeadLetter::new(event, error, self.clock.now());
        match self.dead_letters.record(&letter).await {
            Ok(()) => tracing::error!(
                event_id = %event.id,
                event_type = %event.event_type,
                code = error.code(),
                error = %error,
                "Reconciliation failed; event written to dead-letter store"
            ),
            Err(store_error) => tracing::error!(
                event_id = %event.id,
                event_type = %event.event_type,
                code = error.code(),
                error = %error,
                store_error = %store_error,
                "Reconciliation failed and the dead letter could not be written"
            ),
        }
    }
}
