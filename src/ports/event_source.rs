//! EventSource port - Stripe's authoritative event history.

use async_trait::async_trait;

use super::UpstreamError;
use crate::domain::billing::StripeEvent;
use crate::domain::foundation::EventId;

/// Maximum page size Stripe accepts for list endpoints.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Parameters for one page of the event list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventListQuery {
    /// Event types to include.
    pub types: Vec<String>,
    /// Cursor: id of the last event of the previous page.
    pub starting_after: Option<EventId>,
    pub limit: u32,
}

/// One page of events, newest first as Stripe returns them.
#[derive(Debug, Clone, PartialEq)]
pub struct EventPage {
    pub data: Vec<StripeEvent>,
    pub has_more: bool,
}

/// Port for reading events back from Stripe.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn list_events(&self, query: &EventListQuery) -> Result<EventPage, UpstreamError>;

    async fn retrieve_event(&self, event_id: &EventId) -> Result<StripeEvent, UpstreamError>;
}
