//! Billing reconciliation handlers.
//!
//! ## Intake
//!
//! - `IngestWebhookHandler` - Verify, log and reconcile a webhook delivery
//!
//! ## Reconciliation
//!
//! - `EventReconciler` - Apply one event, dead-lettering failures
//! - `IdentityMapper` - Write-once customer to account links
//! - `SubscriptionMerger` - Monotonic per-subscription merge
//! - `ProductCache` - Staleness-bounded product metadata
//!
//! ## Queries
//!
//! - `GetEntitlementsHandler` - Derived entitlements of an account
//! - `ListDeadLettersHandler` - Failed reconciliations
//!
//! ## Operator
//!
//! - `ReplayEventsHandler` - Re-drive the whole event log
//! - `BackfillAccountHandler` - Rebuild an account from Stripe's event list
//! - `RecoverEventHandler` - Ingest one event fetched from Stripe

mod backfill_account;
mod get_entitlements;
mod identity_mapper;
mod ingest_webhook;
mod list_dead_letters;
mod product_cache;
mod reconcile_event;
mod recover_event;
mod replay_events;
mod subscription_merger;

#[cfg(test)]
pub(crate) mod test_support;

pub use backfill_account::{BackfillAccountHandler, BackfillSummary};
pub use get_entitlements::{GetEntitlementsHandler, GetEntitlementsQuery};
pub use identity_mapper::{EstablishResult, IdentityMapper};
pub use ingest_webhook::{DuplicatePolicy, IngestResult, IngestWebhookCommand, IngestWebhookHandler};
pub use list_dead_letters::ListDeadLettersHandler;
pub use product_cache::{ProductCache, DEFAULT_STALENESS_SECS};
pub use reconcile_event::{EventReconciler, ReconcileOutcome};
pub use recover_event::RecoverEventHandler;
pub use replay_events::{ReplayEventsHandler, ReplaySummary};
pub use subscription_merger::{MergeResult, SubscriptionMerger};
