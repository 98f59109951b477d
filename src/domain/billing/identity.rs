//! Customer to account mapping.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, CustomerId, EventId};

/// Write-once link from a Stripe customer to an internal account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAccountMapping {
    pub customer: CustomerId,
    pub account: AccountId,
    /// Checkout event that created the link.
    pub establishing_event: EventId,
}
