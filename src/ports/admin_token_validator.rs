//! AdminTokenValidator port - Bearer token validation for admin operations.
//!
//! Implementations must validate the token signature, issuer and expiry
//! before reporting whether the caller holds the administrator capability.

use async_trait::async_trait;

use crate::domain::foundation::{AdminPrincipal, AuthError};

/// Validates bearer tokens presented to admin routes.
#[async_trait]
pub trait AdminTokenValidator: Send + Sync {
    /// Validate a raw token (without the "Bearer " prefix).
    ///
    /// * `Err(AuthError::InvalidToken)` - malformed or bad signature
    /// * `Err(AuthError::TokenExpired)` - valid signature but expired
    async fn validate(&self, token: &str) -> Result<AdminPrincipal, AuthError>;
}
