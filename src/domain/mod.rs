//! Domain layer.
//!
//! Pure types and rules with no I/O. Adapters and application services
//! depend on this module, never the other way around.

pub mod billing;
pub mod foundation;
