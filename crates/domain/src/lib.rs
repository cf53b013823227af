//! Domain layer for the users and orders services.
//!
//! This crate provides:
//! - `User` and `Order` entities with their validation rules
//! - `OrderStatus` state machine (`pending` -> `confirmed` | `cancelled`)
//! - Typed validation errors that classify into the shared error taxonomy
//! - Versioned integration events (`user.created`, `order.created`)

pub mod events;
pub mod order;
pub mod user;

pub use events::{
    DomainEvent, EVENT_VERSION, EXCHANGE_ORDERS, EXCHANGE_USERS, EventEnvelope, OrderCreatedEvent,
    OrderCreatedPayload, ROUTING_KEY_ORDER_CREATED, ROUTING_KEY_USER_CREATED, UserCreatedEvent,
    UserCreatedPayload,
};
pub use order::{MAX_ORDER_TOTAL, Order, OrderError, OrderStatus, UnknownOrderStatus};
pub use user::{MAX_NAME_CHARS, MIN_NAME_CHARS, User, UserError, is_valid_email};
