use std::sync::Arc;

use async_trait::async_trait;
use common::{BoxError, RequestContext};

use crate::{Message, Result};

/// Consumer-side callback for one queue.
///
/// Returning an error rejects the delivery; the bus will redeliver it after
/// its retry delay, so handlers must be idempotent.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, ctx: &RequestContext, message: &Message)
    -> std::result::Result<(), BoxError>;
}

/// Topic-routed publish/subscribe collaborator.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Hands a message to the bus, stamped with the context's trace id.
    ///
    /// Returns once the bus has accepted the message. Delivery to consumers
    /// happens later and is never awaited here.
    async fn publish(
        &self,
        ctx: &RequestContext,
        exchange: &str,
        routing_key: &str,
        body: Vec<u8>,
    ) -> Result<()>;

    /// Declares `queue`, binds it to `exchange` for each routing-key pattern
    /// and starts delivering matching messages to `handler`.
    async fn subscribe(
        &self,
        queue: &str,
        exchange: &str,
        routing_keys: &[&str],
        handler: Arc<dyn MessageHandler>,
    ) -> Result<()>;
}
