//! API error type with HTTP response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{AppError, ErrorKind, ErrorResponse, RequestContext, TraceId};
use serde_json::json;

/// A classified error bound to the trace id of the request that produced it.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    trace_id: TraceId,
}

impl ApiError {
    pub fn new(ctx: &RequestContext, error: AppError) -> Self {
        Self {
            error,
            trace_id: ctx.trace_id().clone(),
        }
    }

    /// Malformed or mistyped JSON body.
    pub fn invalid_body(ctx: &RequestContext, rejection: JsonRejection) -> Self {
        Self::new(
            ctx,
            AppError::validation("invalid request body")
                .with_details(json!({ "error": rejection.body_text() })),
        )
    }

    pub fn error(&self) -> &AppError {
        &self.error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.error.kind() {
            ErrorKind::Validation => {
                tracing::debug!(trace_id = %self.trace_id, error = %self.error, "rejected request")
            }
            ErrorKind::Internal => tracing::error!(
                trace_id = %self.trace_id,
                error = %self.error.chain(),
                "internal server error"
            ),
            _ => tracing::info!(trace_id = %self.trace_id, error = %self.error, "request failed"),
        }

        let body = ErrorResponse::from_error(&self.error, &self.trace_id);
        let status =
            StatusCode::from_u16(body.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

/// Response for a failure that never reached a handler, such as a panic.
pub fn internal_error_response(trace_id: &TraceId) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal(trace_id)),
    )
        .into_response()
}
