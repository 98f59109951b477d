//! Product snapshot and tier ranking.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProductId, Timestamp};

/// Stripe product metadata key holding the tier code.
pub const PRODUCT_CODE_METADATA_KEY: &str = "product-code";

/// Denormalized copy of upstream product metadata, refreshed lazily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    /// Tier code from product metadata; absent on products without one.
    pub code: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub livemode: bool,
    /// Wall-clock time the snapshot was fetched.
    pub updated_at: Timestamp,
}

impl ProductSnapshot {
    /// Returns true if the snapshot is younger than `window` at `now`.
    pub fn is_fresh(&self, now: Timestamp, window: Duration) -> bool {
        now.duration_since(&self.updated_at) < window
    }

    pub fn tier(&self) -> ProductTier {
        ProductTier::from_code(self.code.as_deref())
    }
}

/// Entitlement tier a product grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductTier {
    Free,
    Standard,
    Pro,
    Enterprise,
}

impl ProductTier {
    /// Maps a product code to a tier. Unknown or missing codes are free.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("standard") => Self::Standard,
            Some("pro") => Self::Pro,
            Some("enterprise") => Self::Enterprise,
            _ => Self::Free,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Standard => "standard",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Ordering used when several subscriptions qualify.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Free => 0,
            Self::Standard => 1,
            Self::Pro => 2,
            Self::Enterprise => 3,
        }
    }
}
