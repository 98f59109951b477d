//! PostgreSQL adapters - Database implementations for the store ports.
//!
//! - `PostgresEventLog` - `billing_events`
//! - `PostgresCustomerAccounts` - `customer_accounts`
//! - `PostgresSubscriptionState` - `account_subscriptions`, conditional upsert on `event_date`
//! - `PostgresProductSnapshots` - `product_snapshots`
//! - `PostgresDeadLetters` - `reconciliation_errors`
//!
//! Schema lives in `migrations/` and is applied with `sqlx::migrate!`.

mod customer_accounts;
mod dead_letters;
mod event_log;
mod product_snapshots;
mod subscription_state;

pub use customer_accounts::PostgresCustomerAccounts;
pub use dead_letters::PostgresDeadLetters;
pub use event_log::PostgresEventLog;
pub use product_snapshots::PostgresProductSnapshots;
pub use subscription_state::PostgresSubscriptionState;

use crate::ports::StoreError;

/// Maps a sqlx failure onto the port error, keeping the operation in the message.
pub(crate) fn db_error(context: &str, e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::corrupt(format!("{}: {}", context, e))
        }
        other => StoreError::unavailable(format!("{}: {}", context, other)),
    }
}

/// Runs the embedded migrations against the pool.
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
