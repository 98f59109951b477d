//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the reconciliation core and the outside world. Adapters implement these
//! ports.
//!
//! ## Store Ports
//!
//! - `EventLog` - Idempotent log of verified Stripe events
//! - `CustomerAccountRepository` - Write-once customer to account links
//! - `SubscriptionStateRepository` - Per-account subscription map with conditional merge
//! - `ProductSnapshotRepository` - Cached product metadata
//! - `DeadLetterStore` - Events whose reconciliation failed
//!
//! ## Upstream Ports
//!
//! - `SignatureVerifier` - Webhook signature check
//! - `EventSource` - Event listing and retrieval by id
//! - `ProductCatalog` - Product retrieval by id
//!
//! ## Ambient Ports
//!
//! - `Clock` - Injectable wall-clock time
//! - `EntitlementCache` - Best-effort read-through cache
//! - `AdminTokenValidator` - Admin bearer token validation

mod admin_token_validator;
mod clock;
mod customer_account_repository;
mod dead_letter_store;
mod entitlement_cache;
mod event_log;
mod event_source;
mod product_catalog;
mod product_snapshot_repository;
mod signature_verifier;
mod store_error;
mod subscription_state_repository;
mod upstream_error;

pub use admin_token_validator::AdminTokenValidator;
pub use clock::{Clock, SystemClock};
pub use customer_account_repository::CustomerAccountRepository;
pub use dead_letter_store::DeadLetterStore;
pub use entitlement_cache::{EntitlementCache, EntitlementKey};
pub use event_log::EventLog;
pub use event_source::{EventListQuery, EventPage, EventSource, MAX_PAGE_SIZE};
pub use product_catalog::{ProductCatalog, UpstreamProduct};
pub use product_snapshot_repository::ProductSnapshotRepository;
pub use signature_verifier::SignatureVerifier;
pub use store_error::{SaveResult, StoreError};
pub use subscription_state_repository::{MergeOutcome, SubscriptionStateRepository};
pub use upstream_error::{UpstreamError, UpstreamErrorCode};
