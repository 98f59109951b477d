//! PostgreSQL implementation of EventLog.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use super::db_error;
use crate::domain::billing::StripeEvent;
use crate::domain::foundation::EventId;
use crate::ports::{EventLog, SaveResult, StoreError};

/// Event log backed by the `billing_events` table.
pub struct PostgresEventLog {
    pool: PgPool,
}

impl PostgresEventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    payload: Json<StripeEvent>,
}

#[async_trait]
impl EventLog for PostgresEventLog {
    async fn record(&self, event: &StripeEvent) -> Result<SaveResult, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO billing_events (event_id, event_type, created, livemode, payload)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event.id.as_str())
        .bind(&event.event_type)
        .bind(event.created)
        .bind(event.livemode)
        .bind(Json(event))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to record event", e))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn find(&self, event_id: &EventId) -> Result<Option<StripeEvent>, StoreError> {
        let row: Option<EventRow> =
            sqlx::query_as("SELECT payload FROM billing_events WHERE event_id = $1")
                .bind(event_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to find event", e))?;

        Ok(row.map(|r| r.payload.0))
    }

    async fn list_all(&self) -> Result<Vec<StripeEvent>, StoreError> {
        let rows: Vec<EventRow> = sqlx::query_as("SELECT payload FROM billing_events")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to list events", e))?;

        Ok(rows.into_iter().map(|r| r.payload.0).collect())
    }
}
