//! Application layer of the users and orders services.
//!
//! - `users`: user registration with email uniqueness and `user.created` events
//! - `orders`: the order creation workflow (remote user check, validation,
//!   persistence, `order.created` event) and the `user.created` consumer
//! - `publisher`: event publishers backed by the event bus
//!
//! Each service also ships an RPC server implementing its `rpc` trait.

pub mod orders;
pub mod publisher;
pub mod users;

use std::time::Duration;

pub use orders::{
    CreateOrderInput, InMemoryUserLookup, OrderRpcServer, OrderService, RpcUserLookup,
    USER_CREATED_QUEUE, UserCreatedConsumer, UserInfo, UserLookup,
};
pub use publisher::{BusEventPublisher, OrderEventPublisher, UserEventPublisher};
pub use users::{CreateUserInput, UserRpcServer, UserService};

/// Bounds applied to a service's outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// The remote user check.
    pub lookup: Duration,
    /// Each record store call.
    pub storage: Duration,
    /// Handing an event to the bus.
    pub publish: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            lookup: Duration::from_secs(10),
            storage: Duration::from_secs(30),
            publish: Duration::from_secs(5),
        }
    }
}
