//! Integration events published after a successful state change.
//!
//! Every event travels inside a versioned [`EventEnvelope`] which carries the
//! trace id of the request that caused it.

use chrono::{DateTime, Utc};
use common::{OrderId, TraceId, UserId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderStatus};
use crate::user::User;

/// Envelope schema version.
pub const EVENT_VERSION: &str = "1.0";

/// Exchange carrying user events.
pub const EXCHANGE_USERS: &str = "users.events";

/// Exchange carrying order events.
pub const EXCHANGE_ORDERS: &str = "orders.events";

pub const ROUTING_KEY_USER_CREATED: &str = "user.created";
pub const ROUTING_KEY_ORDER_CREATED: &str = "order.created";

/// A payload that can be published as an integration event.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync {
    /// Event type, also used as the routing key.
    const EVENT_TYPE: &'static str;

    /// Exchange the event is published to.
    const EXCHANGE: &'static str;
}

/// Versioned wrapper around an event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<P> {
    pub version: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub trace_id: TraceId,
    pub payload: P,
}

impl<P: DomainEvent> EventEnvelope<P> {
    /// Wraps `payload` with the current version, type and timestamp.
    pub fn new(payload: P, trace_id: &TraceId) -> Self {
        Self {
            version: EVENT_VERSION.to_string(),
            event_type: P::EVENT_TYPE.to_string(),
            timestamp: Utc::now(),
            trace_id: trace_id.clone(),
            payload,
        }
    }

    pub fn routing_key(&self) -> &'static str {
        P::EVENT_TYPE
    }

    pub fn exchange(&self) -> &'static str {
        P::EXCHANGE
    }

    /// Serializes the envelope as JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decodes an envelope from a JSON message body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// Payload of `order.created`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedPayload {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl DomainEvent for OrderCreatedPayload {
    const EVENT_TYPE: &'static str = ROUTING_KEY_ORDER_CREATED;
    const EXCHANGE: &'static str = EXCHANGE_ORDERS;
}

impl From<&Order> for OrderCreatedPayload {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            total: order.total,
            status: order.status,
            created_at: order.created_at,
        }
    }
}

/// Payload of `user.created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreatedPayload {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl DomainEvent for UserCreatedPayload {
    const EVENT_TYPE: &'static str = ROUTING_KEY_USER_CREATED;
    const EXCHANGE: &'static str = EXCHANGE_USERS;
}

impl From<&User> for UserCreatedPayload {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

pub type OrderCreatedEvent = EventEnvelope<OrderCreatedPayload>;
pub type UserCreatedEvent = EventEnvelope<UserCreatedPayload>;

impl OrderCreatedEvent {
    pub fn order_created(order: &Order, trace_id: &TraceId) -> Self {
        Self::new(OrderCreatedPayload::from(order), trace_id)
    }
}

impl UserCreatedEvent {
    pub fn user_created(user: &User, trace_id: &TraceId) -> Self {
        Self::new(UserCreatedPayload::from(user), trace_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn order_created_wire_shape() {
        let mut order = Order::new(UserId::new(1), 99.99).unwrap();
        order.id = OrderId::new(42);
        let event = OrderCreatedEvent::order_created(&order, &TraceId::from("trace-1"));

        let json: Value = serde_json::from_slice(&event.to_bytes().unwrap()).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["event_type"], "order.created");
        assert_eq!(json["trace_id"], "trace-1");
        assert_eq!(json["payload"]["id"], 42);
        assert_eq!(json["payload"]["user_id"], 1);
        assert_eq!(json["payload"]["total"], 99.99);
        assert_eq!(json["payload"]["status"], "pending");
        assert!(json["payload"]["created_at"].is_string());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn routing_follows_payload_type() {
        let user = User::new("John Doe", "john@example.com").unwrap();
        let event = UserCreatedEvent::user_created(&user, &TraceId::generate());
        assert_eq!(event.routing_key(), "user.created");
        assert_eq!(event.exchange(), "users.events");
    }

    #[test]
    fn decodes_published_body() {
        let user = User::new("John Doe", "john@example.com").unwrap();
        let event = UserCreatedEvent::user_created(&user, &TraceId::from("t"));
        let decoded = UserCreatedEvent::from_slice(&event.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.payload.email, "john@example.com");
        assert_eq!(decoded.trace_id.as_str(), "t");
    }

    #[test]
    fn rejects_malformed_body() {
        assert!(UserCreatedEvent::from_slice(b"{not json").is_err());
    }
}
