use std::sync::Arc;

use async_trait::async_trait;
use common::{BoxError, RequestContext};
use domain::{EXCHANGE_USERS, ROUTING_KEY_USER_CREATED, UserCreatedEvent};
use event_bus::{EventBus, Message, MessageHandler};

/// Queue the orders service binds to `user.created`.
pub const USER_CREATED_QUEUE: &str = "orders.user-created";

/// Reacts to new users registered in the users service.
///
/// Decoding failures are returned to the bus, so a malformed message is
/// retried and eventually dead-lettered.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserCreatedConsumer;

impl UserCreatedConsumer {
    /// Subscribes the consumer on `bus`.
    pub async fn register(bus: &dyn EventBus) -> event_bus::Result<()> {
        bus.subscribe(
            USER_CREATED_QUEUE,
            EXCHANGE_USERS,
            &[ROUTING_KEY_USER_CREATED],
            Arc::new(Self),
        )
        .await
    }
}

#[async_trait]
impl MessageHandler for UserCreatedConsumer {
    async fn handle(&self, _ctx: &RequestContext, message: &Message) -> Result<(), BoxError> {
        let event = UserCreatedEvent::from_slice(&message.body)?;
        tracing::info!(
            user_id = %event.payload.id,
            name = %event.payload.name,
            email = %event.payload.email,
            trace_id = %event.trace_id,
            "received user created event"
        );
        Ok(())
    }
}
