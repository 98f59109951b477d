//! Administrator identity and authentication errors.

use thiserror::Error;

/// Caller presenting a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    /// Token subject.
    pub subject: String,
    /// Whether the token carries the administrator capability.
    pub is_admin: bool,
}

impl AdminPrincipal {
    /// Fails with `InsufficientPermissions` unless the principal is an administrator.
    pub fn require_admin(self) -> Result<Self, AuthError> {
        if self.is_admin {
            Ok(self)
        } else {
            Err(AuthError::InsufficientPermissions)
        }
    }
}

/// Errors that can occur while authenticating a caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Administrator capability required")]
    InsufficientPermissions,
}
