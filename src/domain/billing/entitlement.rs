//! Entitlement calculation.
//!
//! Pure function from a set of subscription records to the capability
//! bundle an account is entitled to. No I/O, no clock.

use serde::{Deserialize, Serialize};

use super::{ProductTier, SubscriptionRecord};

/// Capability bundle derived for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub seats: u32,
    pub widgets: u32,
    pub license: ProductTier,
    /// Display name of the winning product; absent on the free tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_name: Option<String>,
    pub team: bool,
}

impl Entitlement {
    /// Bundle granted when no subscription qualifies.
    pub fn free() -> Self {
        Self {
            seats: 1,
            widgets: 3,
            license: ProductTier::Free,
            license_name: None,
            team: false,
        }
    }

    fn for_subscription(subscription: &SubscriptionRecord) -> Self {
        let license_name = Some(subscription.product.name.clone());
        match subscription.product.tier() {
            ProductTier::Free => Self::free(),
            ProductTier::Standard => Self {
                seats: 1,
                widgets: 5,
                license: ProductTier::Standard,
                license_name,
                team: false,
            },
            ProductTier::Pro => Self {
                seats: 5,
                widgets: 20,
                license: ProductTier::Pro,
                license_name,
                team: false,
            },
            ProductTier::Enterprise => Self {
                seats: subscription.quantity,
                widgets: 250,
                license: ProductTier::Enterprise,
                license_name,
                team: true,
            },
        }
    }
}

/// Derives the entitlement for an account's subscriptions.
///
/// Only trialing or active subscriptions count, and unless `include_testing`
/// is set only those where both the subscription and its product are live.
/// An enterprise subscription wins outright; otherwise the highest tier wins
/// and ties keep the first one encountered.
pub fn calculate_entitlements(
    subscriptions: &[SubscriptionRecord],
    include_testing: bool,
) -> Entitlement {
    let mut winner: Option<&SubscriptionRecord> = None;

    let qualifying = subscriptions
        .iter()
        .filter(|s| s.status.is_entitled())
        .filter(|s| include_testing || (s.livemode && s.product.livemode));

    for subscription in qualifying {
        let tier = subscription.product.tier();
        if tier == ProductTier::Enterprise {
            winner = Some(subscription);
            break;
        }
        match winner {
            Some(current) if current.product.tier().rank() >= tier.rank() => {}
            _ => winner = Some(subscription),
        }
    }

    winner.map_or_else(Entitlement::free, Entitlement::for_subscription)
}
