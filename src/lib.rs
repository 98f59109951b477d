//! Entitlement Reconciler - Stripe webhook reconciliation engine
//!
//! Ingests Stripe webhook events and reconciles them into per-account
//! subscription state from which product entitlements are derived. Events
//! are logged once by id, linked to accounts through checkout sessions and
//! merged monotonically by event `created` time, so duplicate and
//! out-of-order delivery converge on the same state.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
