//! HTTP-level tests for the `/api/chat` completion proxy.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::routing::post;
use axum::Json;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use chatrelay::application::DEGRADED_REPLY;
use chatrelay::connector::api::{build_router, Container};
use chatrelay::{ChatResponse, MockCompletionClient, OpenAiCompatibleClient};

async fn spawn(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}", addr)
}

/// Upstream stub that insists on the bearer token and the fixed,
/// non-streaming request shape.
fn upstream_stub() -> axum::Router {
    axum::Router::new().route(
        "/v1/chat/completions",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            let authorized = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                == Some("Bearer test-key");
            let well_formed = body["stream"] == json!(false)
                && body["max_tokens"] == json!(1000)
                && body["model"] == json!("mistralai/mistral-7b-instruct:free")
                && body["messages"][0]["content"] == json!("hello");

            if authorized && well_formed {
                (
                    StatusCode::OK,
                    Json(json!({
                        "choices": [{"message": {"role": "assistant", "content": "Hello from upstream"}}]
                    })),
                )
            } else {
                (StatusCode::UNAUTHORIZED, Json(json!({"error": "rejected"})))
            }
        }),
    )
}

fn failing_upstream() -> axum::Router {
    axum::Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "overloaded") }),
    )
}

fn malformed_upstream() -> axum::Router {
    axum::Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({"choices": []})) }),
    )
}

fn proxy_with(client: OpenAiCompatibleClient) -> axum::Router {
    build_router(Arc::new(Container::with_client(Arc::new(client))))
}

fn mock_proxy() -> axum::Router {
    build_router(Arc::new(Container::with_client(Arc::new(
        MockCompletionClient::new(),
    ))))
}

async fn post_chat(app: axum::Router, body: Value) -> (StatusCode, ChatResponse) {
    post_raw(app, body.to_string()).await
}

async fn post_raw(app: axum::Router, body: String) -> (StatusCode, ChatResponse) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let parsed: ChatResponse = serde_json::from_slice(&bytes).expect("json body");
    (status, parsed)
}

fn hello() -> Value {
    json!({"messages": [{"role": "user", "content": "hello"}], "model": "mistral"})
}

#[tokio::test]
async fn unknown_model_is_400() {
    let (status, body) = post_chat(
        mock_proxy(),
        json!({"messages": [{"role": "user", "content": "hello"}], "model": "gpt-9"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error.as_deref(), Some("Invalid model: gpt-9"));
}

#[tokio::test]
async fn missing_messages_is_400() {
    let (status, body) = post_chat(mock_proxy(), json!({"model": "mistral"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.error.is_some());

    let (status, _) = post_chat(mock_proxy(), json!({"messages": {}, "model": "mistral"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_role_is_400() {
    let (status, body) = post_chat(
        mock_proxy(),
        json!({"messages": [{"role": "system", "content": "hi"}], "model": "mistral"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.error.unwrap().contains("index 0"));
}

#[tokio::test]
async fn missing_model_is_400() {
    let (status, body) = post_chat(mock_proxy(), json!({"messages": []})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.error.unwrap().contains("model"));
}

#[tokio::test]
async fn missing_credential_is_500() {
    let app = proxy_with(OpenAiCompatibleClient::new(None, "http://127.0.0.1:9"));
    let (status, body) = post_chat(app, hello()).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body.error.as_deref(), Some("API key not configured"));
    assert!(body.content.is_none());
}

#[tokio::test]
async fn blank_credential_is_500() {
    let app = proxy_with(OpenAiCompatibleClient::new(
        Some("   ".to_string()),
        "http://127.0.0.1:9",
    ));
    let (status, _) = post_chat(app, hello()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn upstream_success_returns_its_text() {
    let base = spawn(upstream_stub()).await;
    let app = proxy_with(OpenAiCompatibleClient::new(
        Some("test-key".to_string()),
        format!("{}/v1", base),
    ));

    let (status, body) = post_chat(app, hello()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.content.as_deref(), Some("Hello from upstream"));
    assert!(body.error.is_none());
}

#[tokio::test]
async fn upstream_error_status_degrades_to_200() {
    let base = spawn(failing_upstream()).await;
    let app = proxy_with(OpenAiCompatibleClient::new(
        Some("test-key".to_string()),
        format!("{}/v1", base),
    ));

    let (status, body) = post_chat(app, hello()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.content.as_deref(), Some(DEGRADED_REPLY));
    assert!(body.error.is_none());
}

#[tokio::test]
async fn upstream_without_choices_degrades_to_200() {
    let base = spawn(malformed_upstream()).await;
    let app = proxy_with(OpenAiCompatibleClient::new(
        Some("test-key".to_string()),
        format!("{}/v1", base),
    ));

    let (status, body) = post_chat(app, hello()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.content.as_deref(), Some(DEGRADED_REPLY));
}

#[tokio::test]
async fn unreachable_upstream_degrades_to_200() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let app = proxy_with(OpenAiCompatibleClient::new(
        Some("test-key".to_string()),
        format!("http://{}/v1", addr),
    ));
    let (status, body) = post_chat(app, hello()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.content.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn non_json_body_is_200_with_error_and_content() {
    let (status, body) = post_raw(mock_proxy(), "definitely not json".to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.error.is_some());
    assert!(!body.content.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn health_probe_answers() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request");
    let response = mock_proxy().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}
