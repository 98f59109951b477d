//! In-memory adapters for tests and single-process runs.
//!
//! Every store keeps its state behind a `tokio::sync::RwLock`. Conditional
//! writes check and insert under the same write guard, which gives them the
//! same atomicity the Postgres adapters get from `ON CONFLICT`.

mod clock;
mod stores;

pub use clock::ManualClock;
pub use stores::{
    InMemoryCustomerAccounts, InMemoryDeadLetters, InMemoryEventLog, InMemoryProductSnapshots,
    InMemorySubscriptionState,
};
