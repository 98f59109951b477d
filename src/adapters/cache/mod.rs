//! Entitlement cache adapters.

mod ttl;

pub use ttl::{DisabledEntitlementCache, TtlEntitlementCache};
