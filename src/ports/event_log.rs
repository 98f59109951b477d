//! EventLog port - Append-only log of every verified Stripe event.
//!
//! Stripe may deliver the same event more than once. The log keeps exactly
//! one copy per event id and tells the caller whether the write was the
//! first, which is what gates reconciliation.

use async_trait::async_trait;

use super::{SaveResult, StoreError};
use crate::domain::billing::StripeEvent;
use crate::domain::foundation::EventId;

/// Port for the durable event log.
///
/// Implementations should use a uniqueness constraint on the event id so
/// concurrent deliveries of the same event cannot both report `Inserted`.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Stores the event if its id has not been seen.
    ///
    /// A second write of a known id leaves the stored document unchanged and
    /// returns `SaveResult::AlreadyExists`.
    async fn record(&self, event: &StripeEvent) -> Result<SaveResult, StoreError>;

    /// Finds a stored event by id.
    async fn find(&self, event_id: &EventId) -> Result<Option<StripeEvent>, StoreError>;

    /// Returns every stored event. No ordering is guaranteed.
    async fn list_all(&self) -> Result<Vec<StripeEvent>, StoreError>;
}
