//! Billing domain module.
//!
//! Everything needed to turn Stripe events into per-account subscription
//! state and to derive entitlements from that state.
//!
//! # Module Structure
//!
//! - `event` - Raw Stripe event envelope and its classification
//! - `subscription` - Subscription status and the merged subscription record
//! - `product` - Cached product snapshot and tier ranking
//! - `identity` - Customer to account mapping
//! - `dead_letter` - Failed reconciliation record
//! - `entitlement` - Pure entitlement calculator
//! - `errors` - Reconciliation error taxonomy

mod dead_letter;
mod entitlement;
mod errors;
mod event;
mod identity;
mod product;
mod subscription;

pub use dead_letter::DeadLetter;
pub use entitlement::{calculate_entitlements, Entitlement};
pub use errors::ReconcileError;
pub use event::{
    BillingEvent, CheckoutCompleted, StripeEvent, StripeEventData, SubscriptionChange,
    SubscriptionChangeKind, CHECKOUT_COMPLETED, SUBSCRIPTION_EVENTS,
};
pub use identity::CustomerAccountMapping;
pub use product::{ProductSnapshot, ProductTier, PRODUCT_CODE_METADATA_KEY};
pub use subscription::{SubscriptionRecord, SubscriptionStatus};

#[cfg(test)]
pub(crate) use event::StripeEventBuilder;
