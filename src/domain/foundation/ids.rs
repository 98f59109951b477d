//! Strongly-typed identifier value objects.
//!
//! Stripe identifiers (`evt_...`, `cus_...`, `sub_...`, `prod_...`) and the
//! internal account identifier are opaque strings. Wrapping them keeps a
//! customer id from ever being passed where an account id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier, rejecting blank or whitespace-bearing values.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                if value.chars().any(char::is_whitespace) {
                    return Err(ValidationError::invalid_format($field, "contains whitespace"));
                }
                Ok(Self(value))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of a provider event (`evt_...`).
    EventId,
    "event_id"
);

string_id!(
    /// External payer identity issued by Stripe (`cus_...`).
    CustomerId,
    "customer_id"
);

string_id!(
    /// Internal account identity owned by this system.
    AccountId,
    "account_id"
);

string_id!(
    /// Stripe subscription identifier (`sub_...`).
    SubscriptionId,
    "subscription_id"
);

string_id!(
    /// Stripe product identifier (`prod_...`).
    ProductId,
    "product_id"
);
