//! ProductSnapshotRepository port - Stored product metadata.

use async_trait::async_trait;

use super::StoreError;
use crate::domain::billing::ProductSnapshot;
use crate::domain::foundation::ProductId;

/// Port for cached product snapshots.
///
/// Concurrent refreshes of one product may race; the last write wins.
#[async_trait]
pub trait ProductSnapshotRepository: Send + Sync {
    async fn find(&self, product: &ProductId) -> Result<Option<ProductSnapshot>, StoreError>;

    /// Replaces the stored snapshot for `snapshot.product_id`.
    async fn save(&self, snapshot: &ProductSnapshot) -> Result<(), StoreError>;
}
