//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod billing;

pub use billing::{
    // Intake
    DuplicatePolicy, IngestResult, IngestWebhookCommand, IngestWebhookHandler,
    // Reconciliation
    EstablishResult, EventReconciler, IdentityMapper, MergeResult, ProductCache,
    ReconcileOutcome, SubscriptionMerger, DEFAULT_STALENESS_SECS,
    // Queries
    GetEntitlementsHandler, GetEntitlementsQuery, ListDeadLettersHandler,
    // Operator
    BackfillAccountHandler, BackfillSummary, RecoverEventHandler, ReplayEventsHandler,
    ReplaySummary,
};
