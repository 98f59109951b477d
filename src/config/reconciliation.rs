//! Reconciliation tuning

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Largest page the Stripe list endpoints accept.
const MAX_BACKFILL_PAGE_SIZE: u32 = 100;

/// Knobs for the reconciliation engine
#[derive(Debug, Clone, Deserialize)]
pub struct ReconciliationConfig {
    /// Age after which a stored product snapshot is refetched
    #[serde(default = "default_product_staleness")]
    pub product_staleness_secs: i64,

    /// Page size for Stripe event listing during backfill
    #[serde(default = "default_backfill_page_size")]
    pub backfill_page_size: u32,

    #[serde(default = "default_cache_ttl")]
    pub entitlement_cache_ttl_secs: u64,

    #[serde(default = "default_cache_enabled")]
    pub entitlement_cache_enabled: bool,
}

impl ReconciliationConfig {
    pub fn product_staleness(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.product_staleness_secs)
    }

    pub fn entitlement_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.entitlement_cache_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.product_staleness_secs <= 0 {
            return Err(ValidationError::InvalidStalenessWindow);
        }
        if self.backfill_page_size == 0 || self.backfill_page_size > MAX_BACKFILL_PAGE_SIZE {
            return Err(ValidationError::InvalidPageSize);
        }
        if self.entitlement_cache_enabled && self.entitlement_cache_ttl_secs == 0 {
            return Err(ValidationError::InvalidCacheTtl);
        }
        Ok(())
    }
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            product_staleness_secs: default_product_staleness(),
            backfill_page_size: default_backfill_page_size(),
            entitlement_cache_ttl_secs: default_cache_ttl(),
            entitlement_cache_enabled: default_cache_enabled(),
        }
    }
}

fn default_product_staleness() -> i64 {
    7 * 24 * 60 * 60
}

fn default_backfill_page_size() -> u32 {
    MAX_BACKFILL_PAGE_SIZE
}

fn default_cache_ttl() -> u64 {
    10
}

fn default_cache_enabled() -> bool {
    true
}
