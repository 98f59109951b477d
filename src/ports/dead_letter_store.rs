//! DeadLetterStore port - Events whose reconciliation failed.

use async_trait::async_trait;

use super::StoreError;
use crate::domain::billing::DeadLetter;
use crate::domain::foundation::EventId;

/// Port for the dead-letter store.
#[async_trait]
pub trait DeadLetterStore: Send + Sync {
    /// Upserts the entry keyed by its event id.
    async fn record(&self, letter: &DeadLetter) -> Result<(), StoreError>;

    async fn find(&self, event_id: &EventId) -> Result<Option<DeadLetter>, StoreError>;

    /// Lists entries, most recent first.
    async fn list(&self) -> Result<Vec<DeadLetter>, StoreError>;
}
