//! HTTP middleware for axum.
//!
//! - `admin` - Admin bearer token middleware and extractor

pub mod admin;

pub use admin::{admin_auth_middleware, AdminAuthState, RequireAdmin};
