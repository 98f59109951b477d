//! Authentication adapters.
//!
//! - `jwt` - HS256 bearer token validation for admin routes

mod jwt;

pub use jwt::{AdminClaims, JwtAdminValidator};
