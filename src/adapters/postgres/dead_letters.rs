//! PostgreSQL implementation of DeadLetterStore.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use super::db_error;
use crate::domain::billing::{DeadLetter, StripeEvent};
use crate::domain::foundation::{EventId, Timestamp};
use crate::ports::{DeadLetterStore, StoreError};

/// Dead letters backed by the `reconciliation_errors` table.
pub struct PostgresDeadLetters {
    pool: PgPool,
}

impl PostgresDeadLetters {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DeadLetterRow {
    raw_event: Json<StripeEvent>,
    code: String,
    message: String,
    failed_at: DateTime<Utc>,
}

impl From<DeadLetterRow> for DeadLetter {
    fn from(row: DeadLetterRow) -> Self {
        let raw_event = row.raw_event.0;
        DeadLetter {
            event_id: raw_event.id.clone(),
            raw_event,
            code: row.code,
            message: row.message,
            when: Timestamp::from_datetime(row.failed_at),
        }
    }
}

#[async_trait]
impl DeadLetterStore for PostgresDeadLetters {
    async fn record(&self, letter: &DeadLetter) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reconciliation_errors (event_id, raw_event, code, message, failed_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (event_id) DO UPDATE SET
                raw_event = EXCLUDED.raw_event,
                code = EXCLUDED.code,
                message = EXCLUDED.message,
                failed_at = EXCLUDED.failed_at
            "#,
        )
        .bind(letter.event_id.as_str())
        .bind(Json(&letter.raw_event))
        .bind(&letter.code)
        .bind(&letter.message)
        .bind(letter.when.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record dead letter", e))?;

        Ok(())
    }

    async fn find(&self, event_id: &EventId) -> Result<Option<DeadLetter>, StoreError> {
        let row: Option<DeadLetterRow> = sqlx::query_as(
            "SELECT raw_event, code, message, failed_at FROM reconciliation_errors WHERE event_id = $1",
        )
        .bind(event_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find dead letter", e))?;

        Ok(row.map(DeadLetter::from))
    }

    async fn list(&self) -> Result<Vec<DeadLetter>, StoreError> {
        let rows: Vec<DeadLetterRow> = sqlx::query_as(
            "SELECT raw_event, code, message, failed_at FROM reconciliation_errors ORDER BY failed_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list dead letters", e))?;

        Ok(rows.into_iter().map(DeadLetter::from).collect())
    }
}
