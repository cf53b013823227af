//! Integration tests for the gateway, driven through the router.

use std::sync::OnceLock;
use std::time::Duration;

use api::{Config, Platform};
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn test_config() -> Config {
    Config {
        event_retry_delay: Duration::from_millis(10),
        ..Config::default()
    }
}

async fn setup_with(config: Config) -> (Router, Platform) {
    let platform = api::build(&config).await.unwrap();
    let app = api::create_app(
        platform.state.clone(),
        get_metrics_handle(),
        config.request_timeout,
    );
    (app, platform)
}

async fn setup() -> (Router, Platform) {
    setup_with(test_config()).await
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    json: Value,
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> Reply {
    send_traced(app, method, uri, body, None).await
}

async fn send_traced(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<&str>,
    trace_id: Option<&str>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    if let Some(trace_id) = trace_id {
        builder = builder.header("X-Trace-ID", trace_id);
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        headers,
        json,
    }
}

async fn create_user(app: &Router, name: &str, email: &str) -> Reply {
    let body = json!({ "name": name, "email": email }).to_string();
    send(app, "POST", "/api/v1/users", Some(&body)).await
}

async fn create_order(app: &Router, user_id: u64, total: f64) -> Reply {
    let body = json!({ "user_id": user_id, "total": total }).to_string();
    send(app, "POST", "/api/v1/orders", Some(&body)).await
}

fn header<'a>(reply: &'a Reply, name: &str) -> Option<&'a str> {
    reply.headers.get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_health_check() {
    let (app, _platform) = setup().await;

    let reply = send(&app, "GET", "/health", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json["status"], "ok");
    assert!(header(&reply, "x-trace-id").is_some());
}

#[tokio::test]
async fn test_trace_id_is_echoed() {
    let (app, _platform) = setup().await;

    let reply = send_traced(&app, "GET", "/api/v1/orders/999", None, Some("trace-xyz")).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(header(&reply, "x-trace-id"), Some("trace-xyz"));
    assert_eq!(reply.json["trace_id"], "trace-xyz");
}

#[tokio::test]
async fn test_create_and_get_user() {
    let (app, platform) = setup().await;

    let created = create_user(&app, "John Doe", "john@example.com").await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.json["data"]["id"], 1);
    assert_eq!(created.json["data"]["name"], "John Doe");
    assert_eq!(created.json["data"]["email"], "john@example.com");
    assert_eq!(
        created.json["trace_id"].as_str(),
        header(&created, "x-trace-id")
    );

    let fetched = send(&app, "GET", "/api/v1/users/1", None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json["data"], created.json["data"]);

    let bus = platform.bus.as_ref().unwrap();
    let events = bus
        .wait_for_published("user.created", 1, Duration::from_secs(1))
        .await;
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let (app, _platform) = setup().await;

    create_user(&app, "John Doe", "john@example.com").await;
    let reply = create_user(&app, "Other John", "john@example.com").await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.json["error"]["code"], "CONFLICT");
    assert_eq!(reply.json["error"]["message"], "email already exists");
}

#[tokio::test]
async fn test_invalid_user_input() {
    let (app, _platform) = setup().await;

    let reply = create_user(&app, "John Doe", "not-an-email").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(reply.json["error"]["message"], "email format is invalid");

    let reply = create_user(&app, "", "john@example.com").await;
    assert_eq!(reply.json["error"]["message"], "name is required");
}

#[tokio::test]
async fn test_get_missing_user() {
    let (app, _platform) = setup().await;

    let reply = send(&app, "GET", "/api/v1/users/999", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json["error"]["code"], "NOT_FOUND");
    assert_eq!(reply.json["error"]["message"], "user with id '999' not found");
}

#[tokio::test]
async fn test_invalid_path_ids() {
    let (app, _platform) = setup().await;

    for uri in ["/api/v1/users/abc", "/api/v1/users/0", "/api/v1/users/-1"] {
        let reply = send(&app, "GET", uri, None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(reply.json["error"]["message"], "invalid user id");
    }

    let reply = send(&app, "GET", "/api/v1/orders/abc", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json["error"]["message"], "invalid order id");
}

#[tokio::test]
async fn test_create_and_get_order() {
    let (app, platform) = setup().await;
    create_user(&app, "John Doe", "john@example.com").await;

    let created = create_order(&app, 1, 99.99).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let data = &created.json["data"];
    assert_eq!(data["id"], 1);
    assert_eq!(data["user_id"], 1);
    assert_eq!(data["total"], 99.99);
    assert_eq!(data["status"], "pending");
    assert!(data["created_at"].as_str().unwrap().ends_with('Z'));

    let fetched = send(&app, "GET", "/api/v1/orders/1", None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json["data"], created.json["data"]);

    let bus = platform.bus.as_ref().unwrap();
    let events = bus
        .wait_for_published("order.created", 1, Duration::from_secs(1))
        .await;
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].header("x-trace-id"),
        created.json["trace_id"].as_str()
    );
}

#[tokio::test]
async fn test_order_for_unknown_user_is_bad_request() {
    let (app, platform) = setup().await;

    let reply = create_order(&app, 999, 99.99).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(reply.json["error"]["message"], "user not found");
    assert_eq!(reply.json["error"]["details"]["user_id"], 999);

    let missing = send(&app, "GET", "/api/v1/orders/1", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    let bus = platform.bus.as_ref().unwrap();
    assert!(bus.published_with_key("order.created").await.is_empty());
}

#[tokio::test]
async fn test_order_with_invalid_total() {
    let (app, _platform) = setup().await;
    create_user(&app, "John Doe", "john@example.com").await;

    let reply = create_order(&app, 1, -10.0).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json["error"]["message"], "total must be greater than 0");

    let reply = create_order(&app, 1, 2_000_000.0).await;
    assert_eq!(reply.json["error"]["message"], "total cannot exceed 1,000,000");
}

#[tokio::test]
async fn test_malformed_body() {
    let (app, _platform) = setup().await;

    let reply = send(&app, "POST", "/api/v1/orders", Some("{\"user_id\": ")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(reply.json["error"]["message"], "invalid request body");
    assert!(reply.json["error"]["details"]["error"].is_string());

    let reply = send(
        &app,
        "POST",
        "/api/v1/orders",
        Some(r#"{"user_id": "one", "total": 5}"#),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json["error"]["message"], "invalid request body");
}

#[tokio::test]
async fn test_degraded_mode_accepts_any_user() {
    let (app, _platform) = setup_with(Config {
        user_validation_enabled: false,
        events_enabled: false,
        ..test_config()
    })
    .await;

    let reply = create_order(&app, 42, 10.0).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.json["data"]["user_id"], 42);
}

#[tokio::test]
async fn test_panic_becomes_internal_error() {
    let router = Router::new().route(
        "/boom",
        get(|| async {
            if true {
                panic!("handler exploded");
            }
            "unreachable"
        }),
    );
    let app = api::with_observability(router, Duration::from_secs(5));

    let reply = send_traced(&app, "GET", "/boom", None, Some("trace-panic")).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.json["error"]["code"], "INTERNAL_ERROR");
    assert_eq!(reply.json["error"]["message"], "An internal error occurred");
    assert!(reply.json["error"].get("details").is_none());
    assert_eq!(reply.json["trace_id"], "trace-panic");
    assert_eq!(header(&reply, "x-trace-id"), Some("trace-panic"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _platform) = setup().await;
    send(&app, "GET", "/health", None).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("http_requests_total"));
}
