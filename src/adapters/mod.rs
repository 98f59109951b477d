//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the reconciliation core to external systems:
//! - `stripe` - Webhook signature check and REST client
//! - `postgres` - Durable stores (sqlx)
//! - `memory` - In-process stores and a manual clock
//! - `cache` - Entitlement read-through cache
//! - `auth` - Admin bearer token validation
//! - `http` - Axum routes

pub mod auth;
pub mod cache;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;
