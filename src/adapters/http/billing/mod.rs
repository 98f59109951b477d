//! HTTP adapter for the reconciliation engine.
//!
//! - `dto` - Request and response bodies
//! - `handlers` - Axum handlers and `ApiError`
//! - `routes` - Router assembly

mod dto;
mod handlers;
mod routes;

pub use dto::{
    BackfillResponse, DeadLetterResponse, EntitlementsParams, ErrorResponse, RecoverResponse,
    ReplayResponse,
};
pub use handlers::{ApiError, ReconcilerAppState, WEBHOOK_ACK};
pub use routes::{admin_routes, public_routes, reconciler_router};
