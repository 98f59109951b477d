//! HTTP handlers for reconciliation endpoints.
//!
//! These handlers connect Axum routes to the application layer.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::handlers::billing::{
    BackfillAccountHandler, GetEntitlementsHandler, GetEntitlementsQuery, IngestWebhookCommand,
    IngestWebhookHandler, ListDeadLettersHandler, RecoverEventHandler, ReplayEventsHandler,
};
use crate::domain::billing::ReconcileError;
use crate::domain::foundation::{AccountId, AuthError, EventId, ValidationError};
use crate::ports::AdminTokenValidator;

use super::dto::{
    BackfillResponse, DeadLetterResponse, EntitlementsParams, ErrorResponse, RecoverResponse,
    ReplayResponse,
};
use crate::adapters::http::middleware::RequireAdmin;

/// Body acknowledging a webhook delivery.
pub const WEBHOOK_ACK: &str = "reconciler:ok";

const SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the reconciliation routes.
///
/// Handlers are built once at startup and shared across requests.
#[derive(Clone)]
pub struct ReconcilerAppState {
    pub ingest: Arc<IngestWebhookHandler>,
    pub entitlements: Arc<GetEntitlementsHandler>,
    pub replay: Arc<ReplayEventsHandler>,
    pub backfill: Arc<BackfillAccountHandler>,
    pub recover: Arc<RecoverEventHandler>,
    pub dead_letters: Arc<ListDeadLettersHandler>,
    pub admin_validator: Arc<dyn AdminTokenValidator>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/stripe
///
/// Acknowledges once the event is durably logged. Reconciliation failures
/// are dead-lettered and do not change the response.
pub async fn handle_stripe_webhook(
    State(state): State<ReconcilerAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ReconcileError::SignatureInvalid("missing Stripe-Signature header".to_string())
        })?;

    let cmd = IngestWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };
    state.ingest.handle(cmd).await?;

    Ok((StatusCode::OK, WEBHOOK_ACK))
}

// ════════════════════════════════════════════════════════════════════════════════
// Queries
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/accounts/:account_id/entitlements
pub async fn get_entitlements(
    State(state): State<ReconcilerAppState>,
    Path(account_id): Path<String>,
    Query(params): Query<EntitlementsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = GetEntitlementsQuery {
        account: AccountId::new(account_id)?,
        include_testing: params.include_testing,
    };
    let entitlement = state.entitlements.handle(query).await?;
    Ok(Json(entitlement))
}

/// GET /admin/dead-letters
pub async fn list_dead_letters(
    State(state): State<ReconcilerAppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let letters = state.dead_letters.handle().await?;
    let response: Vec<DeadLetterResponse> = letters.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Operator commands
// ════════════════════════════════════════════════════════════════════════════════

/// POST /admin/replay
pub async fn replay_events(
    State(state): State<ReconcilerAppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(operator = %admin.subject, "Event log replay requested");
    let summary = state.replay.handle().await?;
    Ok(Json(ReplayResponse::from(summary)))
}

/// POST /admin/accounts/:account_id/backfill
pub async fn backfill_account(
    State(state): State<ReconcilerAppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let account = AccountId::new(account_id)?;
    tracing::info!(operator = %admin.subject, account_id = %account, "Account backfill requested");
    let summary = state.backfill.handle(&account).await?;
    Ok(Json(BackfillResponse::from(summary)))
}

/// POST /admin/events/:event_id/recover
pub async fn recover_event(
    State(state): State<ReconcilerAppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event_id = EventId::new(event_id)?;
    tracing::info!(operator = %admin.subject, event_id = %event_id, "Event recovery requested");
    let result = state.recover.handle(&event_id).await?;
    Ok(Json(RecoverResponse::from(result)))
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain and auth errors to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Reconcile(ReconcileError),
    Auth(AuthError),
    InvalidPath(ValidationError),
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        Self::Reconcile(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::Auth(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::InvalidPath(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Reconcile(err) => {
                if err.status_code().is_server_error() {
                    tracing::error!(code = err.code(), error = %err, "Request failed");
                } else {
                    tracing::warn!(code = err.code(), error = %err, "Request rejected");
                }
                (err.status_code(), ErrorResponse::new(err.code(), err.to_string()))
            }
            ApiError::Auth(err) => {
                let (status, code) = match err {
                    AuthError::InsufficientPermissions => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                    AuthError::MissingToken
                    | AuthError::InvalidToken(_)
                    | AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
                };
                (status, ErrorResponse::new(code, err.to_string()))
            }
            ApiError::InvalidPath(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_FAILED", err.to_string()),
            ),
        };
        (status, Json(body)).into_response()
    }
}
