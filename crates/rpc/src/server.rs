use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use common::{
    AppError, ErrorKind, GENERIC_INTERNAL_MESSAGE, RequestContext, RpcCode, RpcStatus, TraceId,
    panic_message,
};
use futures_util::FutureExt;
use tracing::Instrument;

use crate::RpcRequest;

/// Server side of every unary call.
///
/// Extracts or generates the trace id, bounds the handler by the server
/// timeout (and the caller's budget, whichever ends first), turns panics into
/// `Internal`, converts the handler's `AppError` into an `RpcStatus` and logs
/// the outcome.
#[derive(Debug, Clone, Copy)]
pub struct ServerInterceptor {
    timeout: Duration,
}

impl ServerInterceptor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn serve_unary<Req, Resp, F, Fut>(
        &self,
        method: &'static str,
        request: RpcRequest<Req>,
        handler: F,
    ) -> Result<Resp, RpcStatus>
    where
        F: FnOnce(RequestContext, Req) -> Fut,
        Fut: Future<Output = Result<Resp, AppError>>,
    {
        let start = Instant::now();
        let trace_id = TraceId::from_optional(request.metadata.trace_id());
        let mut ctx = RequestContext::new(trace_id.clone()).with_timeout(self.timeout);
        if let Some(caller_budget) = request.timeout {
            ctx = ctx.with_timeout(caller_budget);
        }
        let budget = ctx.budget(self.timeout);

        let span = tracing::info_span!("rpc", method, trace_id = %trace_id);
        let fut = AssertUnwindSafe(handler(ctx, request.message)).catch_unwind();
        let outcome = tokio::time::timeout(budget, fut).instrument(span.clone()).await;

        let result = match outcome {
            Ok(Ok(Ok(reply))) => Ok(reply),
            Ok(Ok(Err(err))) => {
                log_handler_error(&span, &err);
                Err(RpcStatus::from(&err))
            }
            Ok(Err(payload)) => {
                tracing::error!(
                    parent: &span,
                    panic = panic_message(&*payload),
                    "rpc handler panicked"
                );
                Err(RpcStatus::internal(GENERIC_INTERNAL_MESSAGE))
            }
            Err(_) => Err(RpcStatus::deadline_exceeded(format!(
                "deadline exceeded after {budget:?}"
            ))),
        };

        let code = match &result {
            Ok(_) => RpcCode::Ok,
            Err(status) => status.code(),
        };
        let duration = start.elapsed();
        metrics::counter!("rpc_requests_total", "method" => method, "code" => code.as_str())
            .increment(1);
        if result.is_ok() {
            tracing::info!(parent: &span, ?duration, "rpc request completed");
        } else {
            tracing::info!(parent: &span, ?duration, rpc_code = %code, "rpc request failed");
        }

        result
    }
}

fn log_handler_error(span: &tracing::Span, err: &AppError) {
    match err.kind() {
        ErrorKind::Validation => tracing::debug!(parent: span, error = %err, "rejected request"),
        ErrorKind::Internal => tracing::error!(parent: span, error = %err.chain(), "handler failed"),
        _ => tracing::info!(parent: span, error = %err, "handler returned error"),
    }
}
