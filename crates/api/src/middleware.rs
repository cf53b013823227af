//! Per-request trace id, deadline, span and panic capture.

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use common::{RequestContext, TRACE_ID_HEADER, TraceId, panic_message};
use futures_util::FutureExt;
use tracing::Instrument;

use crate::error::internal_error_response;

/// Reads `X-Trace-ID` (or generates one), attaches a [`RequestContext`] with
/// the request deadline to the request extensions and echoes the trace id on
/// the response. A panicking handler yields a generic 500.
pub async fn trace_requests(
    State(request_timeout): State<Duration>,
    mut request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let trace_id = TraceId::from_optional(
        request
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok()),
    );
    let ctx = RequestContext::new(trace_id.clone()).with_timeout(request_timeout);
    request.extensions_mut().insert(ctx);

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let span = tracing::info_span!(
        "request",
        trace_id = %trace_id,
        method = %method,
        path = %path,
    );

    let outcome = AssertUnwindSafe(next.run(request))
        .catch_unwind()
        .instrument(span.clone())
        .await;

    let mut response = match outcome {
        Ok(response) => response,
        Err(payload) => {
            tracing::error!(
                parent: &span,
                panic = panic_message(&*payload),
                "request handler panicked"
            );
            internal_error_response(&trace_id)
        }
    };

    if let Ok(value) = HeaderValue::from_str(trace_id.as_str()) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }

    let status = response.status().as_u16();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    tracing::info!(parent: &span, status, duration = ?start.elapsed(), "request completed");

    response
}
