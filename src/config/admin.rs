//! Admin capability configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

const MIN_SECRET_LEN: usize = 32;

/// Settings for validating admin bearer tokens (HS256 JWT)
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Shared HS256 signing secret
    pub jwt_secret: SecretString,

    /// Expected `iss` claim
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
}

impl AdminConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("ADMIN__JWT_SECRET"));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(ValidationError::WeakJwtSecret);
        }
        if self.jwt_issuer.trim().is_empty() {
            return Err(ValidationError::MissingRequired("ADMIN__JWT_ISSUER"));
        }
        Ok(())
    }
}

fn default_issuer() -> String {
    "entitlement-reconciler".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AdminConfig {
        AdminConfig {
            jwt_secret: SecretString::new(secret.to_string()),
            jwt_issuer: default_issuer(),
        }
    }

    #[test]
    fn short_secret_is_rejected() {
        assert_eq!(config("short").validate(), Err(ValidationError::WeakJwtSecret));
        assert!(matches!(config("").validate(), Err(ValidationError::MissingRequired(_))));
    }

    #[test]
    fn long_secret_passes() {
        assert!(config(&"s".repeat(32)).validate().is_ok());
    }
}
