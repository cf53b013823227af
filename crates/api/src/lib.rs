//! REST gateway for the users and orders services.
//!
//! Translates HTTP requests into RPC calls, propagates `X-Trace-ID`, renders
//! the JSON error envelope and exposes health and Prometheus metrics.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

use std::time::Duration;

use axum::Router;
use axum::http::HeaderName;
use axum::routing::{get, post};
use common::TRACE_ID_HEADER;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use bootstrap::{BootstrapError, Platform, build};
pub use config::{Config, LogFormat};
pub use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(
    state: AppState,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    let api = Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/v1/users", post(routes::users::create))
        .route("/api/v1/users/{id}", get(routes::users::get))
        .route("/api/v1/orders", post(routes::orders::create))
        .route("/api/v1/orders/{id}", get(routes::orders::get))
        .with_state(state)
        .merge(metrics_router);

    with_observability(api, request_timeout)
}

/// Wraps a router with the trace-id middleware, CORS and request tracing.
pub fn with_observability(router: Router, request_timeout: Duration) -> Router {
    router
        .layer(axum::middleware::from_fn_with_state(
            request_timeout,
            middleware::trace_requests,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([HeaderName::from_static(TRACE_ID_HEADER)]),
        )
        .layer(TraceLayer::new_for_http())
}
