//! Stripe event envelope and classification.
//!
//! The envelope keeps every field Stripe sent so a stored event can be
//! re-classified on replay. Classification turns the loosely-typed `data.object`
//! into one of the variants the reconciler acts on, with explicit field
//! extraction per variant.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ReconcileError, SubscriptionStatus};
use crate::domain::foundation::{AccountId, CustomerId, EventId, ProductId, SubscriptionId};

/// Event type that links a Stripe customer to an internal account.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Subscription lifecycle event types that are merged into account state.
pub const SUBSCRIPTION_EVENTS: [&str; 3] = [
    "customer.subscription.created",
    "customer.subscription.updated",
    "customer.subscription.deleted",
];

/// Stripe webhook event.
///
/// Fields the reconciler does not read are preserved in `extra` so the
/// stored document matches what Stripe delivered.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: EventId,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix seconds, Stripe's clock).
    pub created: i64,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: Value,

    /// Previous values for updated attributes (only for update events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<Value>,
}

/// Which subscription lifecycle transition an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionChangeKind {
    Created,
    Updated,
    Deleted,
}

impl SubscriptionChangeKind {
    /// Parses one of the supported subscription event types.
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            "customer.subscription.created" => Some(Self::Created),
            "customer.subscription.updated" => Some(Self::Updated),
            "customer.subscription.deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Identity-establishing checkout completion.
///
/// Either side may be absent on a session that was not started from the app;
/// such a session establishes nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCompleted {
    pub customer: Option<CustomerId>,
    pub account: Option<AccountId>,
}

/// The subscription facts carried by a lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionChange {
    pub kind: SubscriptionChangeKind,
    pub subscription_id: SubscriptionId,
    pub customer: CustomerId,
    pub status: SubscriptionStatus,
    pub quantity: u32,
    pub livemode: bool,
    pub created: i64,
    pub product_id: ProductId,
}

/// A Stripe event as the reconciler understands it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    CheckoutCompleted(CheckoutCompleted),
    SubscriptionChanged(SubscriptionChange),
    /// Any event type with no effect on subscription state.
    Other,
}

impl StripeEvent {
    /// Parses a verified webhook body.
    pub fn from_slice(body: &[u8]) -> Result<Self, ReconcileError> {
        let event: StripeEvent = serde_json::from_slice(body)
            .map_err(|e| ReconcileError::MalformedPayload(e.to_string()))?;
        event.validated()
    }

    /// Parses an event document obtained from the Stripe API.
    pub fn from_value(value: Value) -> Result<Self, ReconcileError> {
        let event: StripeEvent = serde_json::from_value(value)
            .map_err(|e| ReconcileError::MalformedPayload(e.to_string()))?;
        event.validated()
    }

    fn validated(self) -> Result<Self, ReconcileError> {
        EventId::new(self.id.as_str())?;
        if self.event_type.trim().is_empty() {
            return Err(ReconcileError::missing_field("type"));
        }
        Ok(self)
    }

    /// Classifies the event into the variant the reconciler acts on.
    ///
    /// Subscription-family types other than created/updated/deleted are
    /// rejected rather than ignored, so a new Stripe event shape surfaces in
    /// the dead-letter store instead of silently drifting entitlements.
    pub fn classify(&self) -> Result<BillingEvent, ReconcileError> {
        if self.event_type == CHECKOUT_COMPLETED {
            let object = &self.data.object;
            return Ok(BillingEvent::CheckoutCompleted(CheckoutCompleted {
                customer: id_field(object.get("customer")).and_then(|s| CustomerId::new(s).ok()),
                account: object
                    .get("client_reference_id")
                    .and_then(Value::as_str)
                    .and_then(|s| AccountId::new(s).ok()),
            }));
        }

        if let Some(kind) = SubscriptionChangeKind::from_event_type(&self.event_type) {
            return self.subscription_change(kind).map(BillingEvent::SubscriptionChanged);
        }

        if self.event_type.contains("subscription") {
            return Err(ReconcileError::UnknownEventType {
                event_type: self.event_type.clone(),
                event_id: self.id.clone(),
            });
        }

        Ok(BillingEvent::Other)
    }

    /// Extracts the customer of any subscription-family event, if present.
    pub fn customer(&self) -> Option<CustomerId> {
        id_field(self.data.object.get("customer")).and_then(|s| CustomerId::new(s).ok())
    }

    fn subscription_change(
        &self,
        kind: SubscriptionChangeKind,
    ) -> Result<SubscriptionChange, ReconcileError> {
        let object = &self.data.object;

        let subscription_id = object
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ReconcileError::missing_field("data.object.id"))?;
        let customer = id_field(object.get("customer"))
            .ok_or_else(|| ReconcileError::missing_field("data.object.customer"))?;
        let status = object
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| ReconcileError::missing_field("data.object.status"))?;
        let product = id_field(object.pointer("/plan/product"))
            .or_else(|| id_field(object.pointer("/items/data/0/price/product")))
            .ok_or_else(|| ReconcileError::missing_field("data.object.plan.product"))?;

        let quantity = object
            .get("quantity")
            .and_then(Value::as_u64)
            .or_else(|| object.pointer("/items/data/0/quantity").and_then(Value::as_u64))
            .map(|q| u32::try_from(q).unwrap_or(u32::MAX))
            .unwrap_or(1);

        Ok(SubscriptionChange {
            kind,
            subscription_id: SubscriptionId::new(subscription_id)?,
            customer: CustomerId::new(customer)?,
            status: SubscriptionStatus::parse(status),
            quantity,
            livemode: object
                .get("livemode")
                .and_then(Value::as_bool)
                .unwrap_or(self.livemode),
            created: self.created,
            product_id: ProductId::new(product)?,
        })
    }
}

/// Reads an id that Stripe may send either as a string or as an expanded object.
fn id_field(value: Option<&Value>) -> Option<&str> {
    match value? {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("id").and_then(Value::as_str),
        _ => None,
    }
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: CHECKOUT_COMPLETED.to_string(),
            created: 1_000,
            object: serde_json::json!({}),
            livemode: true,
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn created(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    pub fn object(mut self, object: Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    /// Shorthand for a subscription lifecycle event.
    pub fn subscription(
        self,
        event_type: &str,
        subscription: &str,
        customer: &str,
        status: &str,
        product: &str,
    ) -> Self {
        self.event_type(event_type).object(serde_json::json!({
            "id": subscription,
            "object": "subscription",
            "customer": customer,
            "status": status,
            "quantity": 1,
            "livemode": true,
            "plan": { "product": product }
        }))
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: EventId::new(self.id).expect("builder event id"),
            event_type: self.event_type,
            created: self.created,
            livemode: self.livemode,
            data: StripeEventData {
                object: self.object,
                previous_attributes: None,
            },
            extra: Map::new(),
        }
    }
}
