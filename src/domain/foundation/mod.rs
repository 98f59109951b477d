//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the timestamp value object, caller identity and
//! validation errors that form the vocabulary of the reconciliation domain.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AdminPrincipal, AuthError};
pub use errors::ValidationError;
pub use ids::{AccountId, CustomerId, EventId, ProductId, SubscriptionId};
pub use timestamp::Timestamp;
