use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{AppError, RequestContext};
use domain::{DomainEvent, EventEnvelope, Order, OrderCreatedEvent, User, UserCreatedEvent};
use event_bus::EventBus;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Emits order events.
#[async_trait]
pub trait OrderEventPublisher: Send + Sync {
    async fn publish_order_created(&self, ctx: &RequestContext, order: &Order)
    -> Result<(), AppError>;
}

/// Emits user events.
#[async_trait]
pub trait UserEventPublisher: Send + Sync {
    async fn publish_user_created(&self, ctx: &RequestContext, user: &User) -> Result<(), AppError>;
}

/// Publishes versioned event envelopes on the event bus.
#[derive(Clone)]
pub struct BusEventPublisher {
    bus: Arc<dyn EventBus>,
}

impl BusEventPublisher {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    async fn publish<P: DomainEvent>(
        &self,
        ctx: &RequestContext,
        event: &EventEnvelope<P>,
    ) -> Result<(), AppError> {
        let result = match event.to_bytes() {
            Ok(body) => self
                .bus
                .publish(ctx, event.exchange(), event.routing_key(), body)
                .await
                .map_err(|e| AppError::internal("failed to publish event").with_source(e)),
            Err(e) => Err(AppError::internal("failed to encode event").with_source(e)),
        };

        if result.is_err() {
            metrics::counter!("events_publish_failed_total", "routing_key" => event.routing_key())
                .increment(1);
        }
        result
    }
}

#[async_trait]
impl OrderEventPublisher for BusEventPublisher {
    async fn publish_order_created(
        &self,
        ctx: &RequestContext,
        order: &Order,
    ) -> Result<(), AppError> {
        self.publish(ctx, &OrderCreatedEvent::order_created(order, ctx.trace_id()))
            .await
    }
}

#[async_trait]
impl UserEventPublisher for BusEventPublisher {
    async fn publish_user_created(&self, ctx: &RequestContext, user: &User) -> Result<(), AppError> {
        self.publish(ctx, &UserCreatedEvent::user_created(user, ctx.trace_id()))
            .await
    }
}

/// Runs a publish on its own task, bounded by `timeout`.
///
/// The caller's request never waits on the bus: dropping or timing out the
/// request leaves the publish running. Failures are logged and counted by
/// the publisher, never returned.
pub(crate) fn spawn_publish<F>(event: &'static str, timeout: Duration, publish: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), AppError>> + Send + 'static,
{
    let task = async move {
        match tokio::time::timeout(timeout, publish).await {
            Ok(Ok(())) => tracing::debug!(event, "event published"),
            Ok(Err(err)) => tracing::error!(event, error = %err.chain(), "failed to publish event"),
            Err(_) => tracing::error!(event, ?timeout, "event publish timed out"),
        }
    };
    tokio::spawn(task.instrument(tracing::Span::current()))
}
