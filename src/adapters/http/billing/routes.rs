//! Axum router configuration for reconciliation endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers::{
    backfill_account, get_entitlements, handle_stripe_webhook, health, list_dead_letters,
    recover_event, replay_events, ReconcilerAppState,
};
use crate::adapters::http::middleware::admin_auth_middleware;

/// Operator routes, mounted under `/admin`.
///
/// # Routes
/// - `POST /replay` - Re-drive the whole event log
/// - `POST /accounts/:account_id/backfill` - Rebuild one account from Stripe
/// - `POST /events/:event_id/recover` - Ingest one event fetched from Stripe
/// - `GET /dead-letters` - List failed reconciliations
pub fn admin_routes(state: &ReconcilerAppState) -> Router<ReconcilerAppState> {
    Router::new()
        .route("/replay", post(replay_events))
        .route("/accounts/:account_id/backfill", post(backfill_account))
        .route("/events/:event_id/recover", post(recover_event))
        .route("/dead-letters", get(list_dead_letters))
        .route_layer(middleware::from_fn_with_state(
            state.admin_validator.clone(),
            admin_auth_middleware,
        ))
}

/// Public routes.
///
/// # Routes
/// - `POST /webhooks/stripe` - Signature-verified webhook intake
/// - `GET /api/accounts/:account_id/entitlements` - Derived entitlements
/// - `GET /health` - Liveness
pub fn public_routes() -> Router<ReconcilerAppState> {
    Router::new()
        .route("/webhooks/stripe", post(handle_stripe_webhook))
        .route("/api/accounts/:account_id/entitlements", get(get_entitlements))
        .route("/health", get(health))
}

/// Complete reconciler router with state applied.
pub fn reconciler_router(state: ReconcilerAppState) -> Router {
    Router::new()
        .merge(public_routes())
        .nest("/admin", admin_routes(&state))
        .with_state(state)
}
