//! Admin capability middleware and extractor for axum.
//!
//! ```text
//! Request → admin_auth_middleware → validates Bearer token, requires admin,
//!                                   injects AdminPrincipal into extensions
//!                                        ↓
//!                               Handler → RequireAdmin reads from extensions
//! ```
//!
//! The middleware depends only on the `AdminTokenValidator` port.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::adapters::http::billing::ApiError;
use crate::domain::foundation::{AdminPrincipal, AuthError};
use crate::ports::AdminTokenValidator;

/// Middleware state - the admin token validator.
pub type AdminAuthState = Arc<dyn AdminTokenValidator>;

/// Rejects the request unless it carries a valid admin bearer token.
///
/// Missing or invalid tokens get 401; valid tokens without the admin
/// capability get 403.
pub async fn admin_auth_middleware(
    State(validator): State<AdminAuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim);

    let principal = match token {
        Some(token) if !token.is_empty() => validator
            .validate(token)
            .await
            .and_then(AdminPrincipal::require_admin),
        _ => Err(AuthError::MissingToken),
    };

    match principal {
        Ok(admin) => {
            request.extensions_mut().insert(admin);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                path = %request.uri().path(),
                error = %e,
                "Admin request rejected"
            );
            ApiError::from(e).into_response()
        }
    }
}

/// Extractor for the administrator injected by `admin_auth_middleware`.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub AdminPrincipal);

impl<S> axum::extract::FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<AdminPrincipal>()
                .cloned()
                .map(RequireAdmin)
                .ok_or(ApiError::Auth(AuthError::MissingToken))
        })
    }
}
