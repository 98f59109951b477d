//! Subscription status and the merged per-subscription record.

use serde::{Deserialize, Serialize};

use super::ProductSnapshot;
use crate::domain::foundation::SubscriptionId;

/// Stripe subscription status.
///
/// Statuses Stripe may add later deserialize as `Unknown` and never grant
/// access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trialing,
    Active,
    PastDue,
    Canceled,
    Unpaid,
    Incomplete,
    IncompleteExpired,
    Paused,
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    /// Parses a Stripe status string.
    pub fn parse(s: &str) -> Self {
        match s {
            "trialing" => Self::Trialing,
            "active" => Self::Active,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            "unpaid" => Self::Unpaid,
            "incomplete" => Self::Incomplete,
            "incomplete_expired" => Self::IncompleteExpired,
            "paused" => Self::Paused,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Paused => "paused",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true for the statuses that confer entitlements.
    pub fn is_entitled(&self) -> bool {
        matches!(self, Self::Trialing | Self::Active)
    }
}

/// Latest known fact about one subscription of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: SubscriptionId,
    pub status: SubscriptionStatus,
    pub quantity: u32,
    pub livemode: bool,
    /// `created` of the Stripe event this record was built from.
    pub event_date: i64,
    pub product: ProductSnapshot,
}

impl SubscriptionRecord {
    /// Returns true if an event created at `created` would replace this record.
    pub fn is_superseded_by(&self, created: i64) -> bool {
        created > self.event_date
    }
}
