use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::RequestContext;
use futures_util::FutureExt;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;

use crate::{
    BusError, Message, Result,
    bus::{EventBus, MessageHandler},
    topic::topic_matches,
};

/// Redelivery policy of the in-memory bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Wait before a rejected message goes back on its queue.
    pub retry_delay: Duration,
    /// Deliveries before a message is dead-lettered.
    pub max_deliveries: u32,
    /// Most recent published and dead-lettered messages kept for inspection.
    /// Older entries are dropped first. Zero keeps nothing.
    pub record_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(1),
            max_deliveries: 5,
            record_capacity: 1024,
        }
    }
}

struct Queue {
    name: String,
    exchange: String,
    patterns: Vec<String>,
    sender: mpsc::UnboundedSender<Message>,
    worker: JoinHandle<()>,
}

impl Queue {
    fn accepts(&self, exchange: &str, routing_key: &str) -> bool {
        self.exchange == exchange && self.patterns.iter().any(|p| topic_matches(p, routing_key))
    }
}

#[derive(Default)]
struct Inner {
    config: BusConfig,
    queues: RwLock<Vec<Queue>>,
    published: RwLock<VecDeque<Message>>,
    dead_letters: RwLock<VecDeque<Message>>,
    closed: AtomicBool,
}

/// In-memory event bus.
///
/// Every queue gets its own worker task. A rejected delivery is retried
/// after `retry_delay`; after `max_deliveries` attempts it is moved to the
/// dead-letter list. Messages matching no queue are dropped. The most recent
/// accepted messages, up to `record_capacity`, can be inspected with
/// [`published`].
///
/// [`published`]: InMemoryEventBus::published
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    inner: Arc<Inner>,
}

impl InMemoryEventBus {
    /// Creates a bus with the default redelivery policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                ..Inner::default()
            }),
        }
    }

    pub fn config(&self) -> BusConfig {
        self.inner.config
    }

    /// Returns the recorded messages accepted by `publish`, oldest first.
    pub async fn published(&self) -> Vec<Message> {
        self.inner.published.read().await.iter().cloned().collect()
    }

    /// Returns accepted messages with the given routing key.
    pub async fn published_with_key(&self, routing_key: &str) -> Vec<Message> {
        self.inner
            .published
            .read()
            .await
            .iter()
            .filter(|m| m.routing_key == routing_key)
            .cloned()
            .collect()
    }

    /// Waits until at least `count` recorded messages carry `routing_key`,
    /// or `timeout` passes, and returns what was recorded by then.
    pub async fn wait_for_published(
        &self,
        routing_key: &str,
        count: usize,
        timeout: Duration,
    ) -> Vec<Message> {
        let deadline = Instant::now() + timeout;
        loop {
            let found = self.published_with_key(routing_key).await;
            if found.len() >= count || Instant::now() >= deadline {
                return found;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Returns recorded messages that exhausted their deliveries.
    pub async fn dead_letters(&self) -> Vec<Message> {
        self.inner.dead_letters.read().await.iter().cloned().collect()
    }

    /// Stops all workers and rejects further publishes.
    pub async fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let queues = std::mem::take(&mut *self.inner.queues.write().await);
        for queue in queues {
            queue.worker.abort();
            tracing::info!(queue = %queue.name, "consumer stopped");
        }
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(
        &self,
        ctx: &RequestContext,
        exchange: &str,
        routing_key: &str,
        body: Vec<u8>,
    ) -> Result<()> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let message = Message::new(exchange, routing_key, body, ctx.trace_id());
        record(
            &mut *self.inner.published.write().await,
            self.inner.config.record_capacity,
            message.clone(),
        );

        let queues = self.inner.queues.read().await;
        let mut routed = 0usize;
        for queue in queues.iter().filter(|q| q.accepts(exchange, routing_key)) {
            if queue.sender.send(message.clone()).is_ok() {
                routed += 1;
            } else {
                tracing::warn!(queue = %queue.name, "queue worker is gone, message not routed");
            }
        }

        metrics::counter!(
            "events_published_total",
            "exchange" => exchange.to_string(),
            "routing_key" => routing_key.to_string()
        )
        .increment(1);
        tracing::debug!(
            exchange,
            routing_key,
            message_id = %message.id,
            trace_id = %ctx.trace_id(),
            routed,
            "message published"
        );

        Ok(())
    }

    async fn subscribe(
        &self,
        queue: &str,
        exchange: &str,
        routing_keys: &[&str],
        handler: Arc<dyn MessageHandler>,
    ) -> Result<()> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }

        let mut queues = self.inner.queues.write().await;
        if queues.iter().any(|q| q.name == queue) {
            return Err(BusError::QueueExists(queue.to_string()));
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(
            queue.to_string(),
            handler,
            receiver,
            sender.clone(),
            Arc::clone(&self.inner),
        ));

        queues.push(Queue {
            name: queue.to_string(),
            exchange: exchange.to_string(),
            patterns: routing_keys.iter().map(|k| k.to_string()).collect(),
            sender,
            worker,
        });

        tracing::info!(queue, exchange, ?routing_keys, "consumer started");
        Ok(())
    }
}

fn record(log: &mut VecDeque<Message>, capacity: usize, message: Message) {
    if capacity == 0 {
        return;
    }
    while log.len() >= capacity {
        log.pop_front();
    }
    log.push_back(message);
}

async fn run_worker(
    queue: String,
    handler: Arc<dyn MessageHandler>,
    mut receiver: mpsc::UnboundedReceiver<Message>,
    requeue: mpsc::UnboundedSender<Message>,
    inner: Arc<Inner>,
) {
    let BusConfig {
        retry_delay,
        max_deliveries,
        ..
    } = inner.config;

    while let Some(mut message) = receiver.recv().await {
        message.delivery_count += 1;
        let ctx = RequestContext::new(message.trace_id());
        let span = tracing::info_span!(
            "delivery",
            queue = %queue,
            routing_key = %message.routing_key,
            trace_id = %ctx.trace_id(),
            delivery = message.delivery_count,
        );

        let outcome = AssertUnwindSafe(handler.handle(&ctx, &message))
            .catch_unwind()
            .instrument(span.clone())
            .await;

        let failure = match outcome {
            Ok(Ok(())) => {
                tracing::debug!(parent: &span, "message handled");
                continue;
            }
            Ok(Err(err)) => err.to_string(),
            Err(_) => "handler panicked".to_string(),
        };

        if message.delivery_count >= max_deliveries {
            tracing::error!(
                parent: &span,
                error = %failure,
                "delivery attempts exhausted, dead-lettering message"
            );
            metrics::counter!("events_dead_lettered_total", "queue" => queue.clone()).increment(1);
            record(
                &mut *inner.dead_letters.write().await,
                inner.config.record_capacity,
                message,
            );
            continue;
        }

        tracing::error!(parent: &span, error = %failure, "failed to handle message, requeueing");
        metrics::counter!("events_redelivered_total", "queue" => queue.clone()).increment(1);
        tokio::time::sleep(retry_delay).await;
        if requeue.send(message).is_err() {
            break;
        }
    }
}
