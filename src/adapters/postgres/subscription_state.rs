//! PostgreSQL implementation of SubscriptionStateRepository.
//!
//! Each subscription is its own row keyed by `(account_id, subscription_id)`.
//! The merge is one statement: an upsert whose `DO UPDATE` only fires when
//! the stored `event_date` is older than the incoming one, so the staleness
//! check and the write cannot interleave with another writer.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use super::db_error;
use crate::domain::billing::{ProductSnapshot, SubscriptionRecord, SubscriptionStatus};
use crate::domain::foundation::{AccountId, SubscriptionId};
use crate::ports::{MergeOutcome, StoreError, SubscriptionStateRepository};

/// Subscription state backed by the `account_subscriptions` table.
pub struct PostgresSubscriptionState {
    pool: PgPool,
}

impl PostgresSubscriptionState {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    subscription_id: String,
    status: String,
    quantity: i32,
    livemode: bool,
    event_date: i64,
    product: Json<ProductSnapshot>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = StoreError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionRecord {
            id: SubscriptionId::new(row.subscription_id)
                .map_err(|e| StoreError::corrupt(format!("Invalid subscription_id: {}", e)))?,
            status: SubscriptionStatus::parse(&row.status),
            quantity: u32::try_from(row.quantity)
                .map_err(|_| StoreError::corrupt(format!("Negative quantity {}", row.quantity)))?,
            livemode: row.livemode,
            event_date: row.event_date,
            product: row.product.0,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT subscription_id, status, quantity, livemode, event_date, product FROM account_subscriptions";

#[async_trait]
impl SubscriptionStateRepository for PostgresSubscriptionState {
    async fn find(
        &self,
        account: &AccountId,
        subscription: &SubscriptionId,
    ) -> Result<Option<SubscriptionRecord>, StoreError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "{} WHERE account_id = $1 AND subscription_id = $2",
            SELECT_COLUMNS
        ))
        .bind(account.as_str())
        .bind(subscription.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find subscription", e))?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn list_for_account(
        &self,
        account: &AccountId,
    ) -> Result<Vec<SubscriptionRecord>, StoreError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "{} WHERE account_id = $1 ORDER BY event_date ASC, subscription_id ASC",
            SELECT_COLUMNS
        ))
        .bind(account.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list subscriptions", e))?;

        rows.into_iter().map(SubscriptionRecord::try_from).collect()
    }

    async fn merge_if_newer(
        &self,
        account: &AccountId,
        record: &SubscriptionRecord,
    ) -> Result<MergeOutcome, StoreError> {
        let quantity = i32::try_from(record.quantity).unwrap_or(i32::MAX);

        let result = sqlx::query(
            r#"
            INSERT INTO account_subscriptions (
                account_id, subscription_id, status, quantity, livemode, event_date, product
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (account_id, subscription_id) DO UPDATE SET
                status = EXCLUDED.status,
                quantity = EXCLUDED.quantity,
                livemode = EXCLUDED.livemode,
                event_date = EXCLUDED.event_date,
                product = EXCLUDED.product,
                updated_at = NOW()
            WHERE account_subscriptions.event_date < EXCLUDED.event_date
            "#,
        )
        .bind(account.as_str())
        .bind(record.id.as_str())
        .bind(record.status.as_str())
        .bind(quantity)
        .bind(record.livemode)
        .bind(record.event_date)
        .bind(Json(&record.product))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to merge subscription", e))?;

        if result.rows_affected() == 0 {
            Ok(MergeOutcome::Stale)
        } else {
            Ok(MergeOutcome::Applied)
        }
    }
}
