//! HS256 JWT validation for the administrator capability.
//!
//! Tokens are signed with a shared secret held by the operator tooling. A
//! token grants the capability when it carries `"admin": true` or lists
//! `"admin"` in its `roles` claim.

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AdminPrincipal, AuthError};
use crate::ports::AdminTokenValidator;

/// Role name that grants the administrator capability.
const ADMIN_ROLE: &str = "admin";

/// Claims read from admin tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Subject - the operator id
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Expiry timestamp (Unix epoch seconds)
    pub exp: i64,

    #[serde(default)]
    pub admin: bool,

    #[serde(default)]
    pub roles: Vec<String>,
}

impl AdminClaims {
    fn is_admin(&self) -> bool {
        self.admin || self.roles.iter().any(|r| r == ADMIN_ROLE)
    }
}

/// Validates admin bearer tokens signed with a shared HS256 secret.
pub struct JwtAdminValidator {
    secret: SecretString,
    issuer: String,
}

impl JwtAdminValidator {
    pub fn new(secret: SecretString, issuer: impl Into<String>) -> Self {
        Self {
            secret,
            issuer: issuer.into(),
        }
    }
}

#[async_trait]
impl AdminTokenValidator for JwtAdminValidator {
    async fn validate(&self, token: &str) -> Result<AdminPrincipal, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());

        let data = decode::<AdminClaims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => {
                tracing::debug!("Admin token expired");
                AuthError::TokenExpired
            }
            ErrorKind::InvalidIssuer => {
                tracing::warn!("Invalid issuer in admin token");
                AuthError::InvalidToken("invalid issuer".to_string())
            }
            _ => {
                tracing::warn!(error = %e, "Admin token rejected");
                AuthError::InvalidToken(e.to_string())
            }
        })?;

        Ok(AdminPrincipal {
            is_admin: data.claims.is_admin(),
            subject: data.claims.sub,
        })
    }
}
