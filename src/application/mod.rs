//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Write paths (ingestion, replay, backfill) and read paths (entitlements,
//! dead letters) live in separate handlers.

pub mod handlers;

pub use handlers::{
    BackfillAccountHandler, BackfillSummary, DuplicatePolicy, EventReconciler,
    GetEntitlementsHandler, GetEntitlementsQuery, IdentityMapper, IngestResult,
    IngestWebhookCommand, IngestWebhookHandler, ListDeadLettersHandler, ProductCache,
    ReconcileOutcome, RecoverEventHandler, ReplayEventsHandler, ReplaySummary,
    SubscriptionMerger,
};
