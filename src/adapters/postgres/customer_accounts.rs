//! PostgreSQL implementation of CustomerAccountRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use super::db_error;
use crate::domain::billing::CustomerAccountMapping;
use crate::domain::foundation::{AccountId, CustomerId};
use crate::ports::{CustomerAccountRepository, SaveResult, StoreError};

/// Customer mappings backed by the `customer_accounts` table.
///
/// The primary key on `customer_id` plus `ON CONFLICT DO NOTHING` makes the
/// first insert win even under concurrent checkouts.
pub struct PostgresCustomerAccounts {
    pool: PgPool,
}

impl PostgresCustomerAccounts {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode<T, F>(raw: String, parse: F) -> Result<T, StoreError>
where
    F: FnOnce(String) -> Result<T, crate::domain::foundation::ValidationError>,
{
    parse(raw).map_err(|e| StoreError::corrupt(e.to_string()))
}

#[async_trait]
impl CustomerAccountRepository for PostgresCustomerAccounts {
    async fn insert_if_absent(
        &self,
        mapping: &CustomerAccountMapping,
    ) -> Result<SaveResult, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO customer_accounts (customer_id, account_id, establishing_event_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (customer_id) DO NOTHING
            "#,
        )
        .bind(mapping.customer.as_str())
        .bind(mapping.account.as_str())
        .bind(mapping.establishing_event.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert customer mapping", e))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn find_account(&self, customer: &CustomerId) -> Result<Option<AccountId>, StoreError> {
        let account: Option<String> =
            sqlx::query_scalar("SELECT account_id FROM customer_accounts WHERE customer_id = $1")
                .bind(customer.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find customer mapping", e))?;

        account.map(|a| decode(a, AccountId::new)).transpose()
    }

    async fn find_customers(&self, account: &AccountId) -> Result<Vec<CustomerId>, StoreError> {
        let customers: Vec<String> = sqlx::query_scalar(
            "SELECT customer_id FROM customer_accounts WHERE account_id = $1 ORDER BY customer_id",
        )
        .bind(account.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list account customers", e))?;

        customers.into_iter().map(|c| decode(c, CustomerId::new)).collect()
    }
}
