//! Request-scoped context threaded through every downstream call.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::trace::TraceId;

/// Returned when a bounded call runs out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline exceeded after {0:?}")]
pub struct DeadlineExceeded(pub Duration);

/// Carries the trace identifier and the caller's deadline.
///
/// A context is created once per inbound request and passed by reference to
/// every call that may suspend. Dropping the request future cancels all
/// in-flight work; the deadline bounds it in time.
#[derive(Debug, Clone)]
pub struct RequestContext {
    trace_id: TraceId,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Creates a context with no deadline.
    pub fn new(trace_id: TraceId) -> Self {
        Self {
            trace_id,
            deadline: None,
        }
    }

    /// Creates a context with a freshly generated trace identifier.
    pub fn generate() -> Self {
        Self::new(TraceId::generate())
    }

    /// Tightens the deadline to at most `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Tightens the deadline to at most `deadline`. An earlier existing
    /// deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        });
        self
    }

    /// Returns a copy with the same trace identifier and no deadline.
    ///
    /// Used for best-effort work that may outlive the request, such as event
    /// emission after a commit.
    pub fn detached(&self) -> Self {
        Self::new(self.trace_id.clone())
    }

    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if any.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns true if the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|r| r.is_zero())
    }

    /// The effective timeout for a call bounded by `timeout`.
    pub fn budget(&self, timeout: Duration) -> Duration {
        match self.remaining() {
            Some(remaining) => remaining.min(timeout),
            None => timeout,
        }
    }

    /// Runs `fut` bounded by both `timeout` and the context deadline.
    ///
    /// An already expired context fails without polling `fut` at all.
    pub async fn run<F>(&self, timeout: Duration, fut: F) -> Result<F::Output, DeadlineExceeded>
    where
        F: Future,
    {
        let budget = self.budget(timeout);
        if budget.is_zero() {
            return Err(DeadlineExceeded(budget));
        }
        tokio::time::timeout(budget, fut)
            .await
            .map_err(|_| DeadlineExceeded(budget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_deadline_by_default() {
        let ctx = RequestContext::generate();
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_expired());
        assert_eq!(ctx.budget(Duration::from_secs(3)), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_deadline_wins() {
        let ctx = RequestContext::generate()
            .with_timeout(Duration::from_secs(1))
            .with_timeout(Duration::from_secs(10));
        assert!(ctx.budget(Duration::from_secs(5)) <= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn run_times_out_at_deadline() {
        let ctx = RequestContext::generate().with_timeout(Duration::from_millis(50));
        let result = ctx
            .run(Duration::from_secs(5), tokio::time::sleep(Duration::from_secs(1)))
            .await;
        assert!(result.is_err());
        assert!(ctx.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_context_never_polls_the_future() {
        let ctx = RequestContext::generate().with_timeout(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let polled = std::sync::atomic::AtomicBool::new(false);
        let result = ctx
            .run(Duration::from_secs(5), async {
                polled.store(true, std::sync::atomic::Ordering::SeqCst);
            })
            .await;
        assert!(result.is_err());
        assert!(!polled.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn run_returns_output_within_budget() {
        let ctx = RequestContext::generate();
        let value = ctx.run(Duration::from_secs(1), async { 7 }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn detached_keeps_trace_and_drops_deadline() {
        let ctx = RequestContext::new(TraceId::from("t-1")).with_timeout(Duration::from_secs(1));
        let detached = ctx.detached();
        assert_eq!(detached.trace_id().as_str(), "t-1");
        assert!(detached.deadline().is_none());
    }
}
