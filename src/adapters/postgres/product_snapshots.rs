//! PostgreSQL implementation of ProductSnapshotRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::db_error;
use crate::domain::billing::ProductSnapshot;
use crate::domain::foundation::{ProductId, Timestamp};
use crate::ports::{ProductSnapshotRepository, StoreError};

/// Product snapshots backed by the `product_snapshots` table.
pub struct PostgresProductSnapshots {
    pool: PgPool,
}

impl PostgresProductSnapshots {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    product_id: String,
    code: Option<String>,
    name: String,
    description: Option<String>,
    livemode: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for ProductSnapshot {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(ProductSnapshot {
            product_id: ProductId::new(row.product_id)
                .map_err(|e| StoreError::corrupt(format!("Invalid product_id: {}", e)))?,
            code: row.code,
            name: row.name,
            description: row.description,
            livemode: row.livemode,
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl ProductSnapshotRepository for PostgresProductSnapshots {
    async fn find(&self, product: &ProductId) -> Result<Option<ProductSnapshot>, StoreError> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT product_id, code, name, description, livemode, updated_at
            FROM product_snapshots
            WHERE product_id = $1
            "#,
        )
        .bind(product.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find product snapshot", e))?;

        row.map(ProductSnapshot::try_from).transpose()
    }

    async fn save(&self, snapshot: &ProductSnapshot) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO product_snapshots (product_id, code, name, description, livemode, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (product_id) DO UPDATE SET
                code = EXCLUDED.code,
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                livemode = EXCLUDED.livemode,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(snapshot.product_id.as_str())
        .bind(&snapshot.code)
        .bind(&snapshot.name)
        .bind(&snapshot.description)
        .bind(snapshot.livemode)
        .bind(snapshot.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to save product snapshot", e))?;

        Ok(())
    }
}
