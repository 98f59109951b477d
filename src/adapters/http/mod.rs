//! HTTP adapters - REST API implementations.

pub mod billing;
pub mod middleware;

pub use billing::{reconciler_router, ReconcilerAppState};
