//! ProductCache - Staleness-bounded product metadata.
//!
//! A stored snapshot younger than the staleness window is served as is. An
//! older or missing one is fetched from Stripe and stored with the current
//! time. A failed fetch fails the caller; there is no fallback to the stale
//! copy because the product code decides the entitlement tier.

use std::sync::Arc;

use chrono::Duration;

use crate::domain::billing::{ProductSnapshot, ReconcileError, PRODUCT_CODE_METADATA_KEY};
use crate::domain::foundation::ProductId;
use crate::ports::{Clock, ProductCatalog, ProductSnapshotRepository};

/// Default staleness window (one week).
pub const DEFAULT_STALENESS_SECS: i64 = 7 * 24 * 60 * 60;

pub struct ProductCache {
    repository: Arc<dyn ProductSnapshotRepository>,
    catalog: Arc<dyn ProductCatalog>,
    clock: Arc<dyn Clock>,
    staleness_window: Duration,
}

impl ProductCache {
    pub fn new(
        repository: Arc<dyn ProductSnapshotRepository>,
        catalog: Arc<dyn ProductCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            catalog,
            clock,
            staleness_window: Duration::seconds(DEFAULT_STALENESS_SECS),
        }
    }

    pub fn with_staleness_window(mut self, window: Duration) -> Self {
        self.staleness_window = window;
        self
    }

    /// Returns a snapshot no older than the staleness window.
    pub async fn ensure(&self, product_id: &ProductId) -> Result<ProductSnapshot, ReconcileError> {
        let now = self.clock.now();

        if let Some(snapshot) = self.repository.find(product_id).await? {
            if snapshot.is_fresh(now, self.staleness_window) {
                return Ok(snapshot);
            }
        }

        let product = self.catalog.retrieve_product(product_id).await.map_err(|e| {
            tracing::warn!(product_id = %product_id, error = %e, "Product fetch failed");
            ReconcileError::from(e)
        })?;

        let snapshot = ProductSnapshot {
            product_id: product_id.clone(),
            code: product.metadata.get(PRODUCT_CODE_METADATA_KEY).cloned(),
            name: product.name,
            description: product.description,
            livemode: product.livemode,
            updated_at: now,
        };

        self.repository.save(&snapshot).await?;
        tracing::info!(
            product_id = %product_id,
            code = snapshot.code.as_deref().unwrap_or(""),
            "Refreshed product snapshot"
        );

        Ok(snapshot)
    }
}
