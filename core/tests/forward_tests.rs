//! End-to-end relay tests: the real router driven in-process with `oneshot`,
//! against a mock backend.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use tower::ServiceExt;

use replica_core::proxy::server::{router, AppState};
use replica_core::proxy::UpstreamClient;

fn app(origin: Option<String>) -> Router {
    router(AppState {
        upstream: Arc::new(UpstreamClient::new(origin)),
    })
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, bytes::Bytes) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body)
}

fn parse(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn missing_origin_answers_500_without_calling_upstream() {
    let mut backend = Server::new_async().await;
    let never_hit = backend
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    // The backend exists and is reachable; the proxy just has no origin.
    let (status, _, body) = send(
        app(None),
        Request::builder()
            .uri("/api/chat/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(parse(&body), json!({"error": "Missing BACKEND_URL env var"}));
    never_hit.assert_async().await;
}

#[tokio::test]
async fn wildcard_path_joins_cleanly_despite_trailing_slash_on_origin() {
    let mut backend = Server::new_async().await;
    let health = backend
        .mock("GET", "/api/chat/health")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status":"healthy","providers":{"chat":{"active":"openai","available":["openai"]},"embeddings":{"active":"openai","available":["openai"]}}}"#)
        .create_async()
        .await;

    // Origin configured WITH a trailing slash; the target must still be
    // <origin>/api/chat/health, not <origin>//api/chat/health.
    let origin = format!("{}/", backend.url());
    let (status, _, body) = send(
        app(Some(origin)),
        Request::builder()
            .uri("/api/chat/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["status"], "healthy");
    health.assert_async().await;
}

#[tokio::test]
async fn bare_api_prefix_forwards_to_backend_api_root() {
    let mut backend = Server::new_async().await;
    let root = backend
        .mock("GET", "/api/")
        .with_status(200)
        .with_body("api root")
        .expect(2)
        .create_async()
        .await;

    let app = app(Some(backend.url()));
    for uri in ["/api", "/api/"] {
        let (status, _, body) = send(
            app.clone(),
            Request::builder().uri(uri).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "uri {}", uri);
        assert_eq!(&body[..], b"api root");
    }
    root.assert_async().await;
}

#[tokio::test]
async fn get_never_forwards_an_inbound_body() {
    let mut backend = Server::new_async().await;
    let greeting = backend
        .mock("GET", "/api/chat/greeting")
        .match_body(Matcher::Exact(String::new()))
        .match_header("content-length", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message":"Hi, I'm the assistant.","provider":"openai"}"#)
        .create_async()
        .await;

    let (status, _, _) = send(
        app(Some(backend.url())),
        Request::builder()
            .method("GET")
            .uri("/api/chat/greeting")
            .header("content-type", "text/plain")
            .body(Body::from("ignore me"))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    greeting.assert_async().await;
}

#[tokio::test]
async fn post_json_body_is_reserialized_not_copied() {
    let mut backend = Server::new_async().await;

    // The upstream must see the serializer's canonical encoding of the
    // caller's document, not the caller's whitespace.
    let expected = serde_json::to_string(&json!({
        "user_id": "u7",
        "session_id": "s1",
        "query": "What do you do?",
        "stream": false
    }))
    .unwrap();

    let query = backend
        .mock("POST", "/api/chat/query")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Exact(expected))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"response":"I build things.","intent":"personal_info","confidence":0.88,"response_time_ms":412,"provider":"openai"}"#)
        .create_async()
        .await;

    let inbound = "{ \"user_id\" : \"u7\" ,\n  \"session_id\" : \"s1\" ,\n  \"query\" : \"What do you do?\" ,\n  \"stream\" : false }";
    let (status, _, body) = send(
        app(Some(backend.url())),
        Request::builder()
            .method("POST")
            .uri("/api/chat/query")
            .header("content-type", "application/json")
            .body(Body::from(inbound))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["intent"], "personal_info");
    query.assert_async().await;
}

#[tokio::test]
async fn unsafe_request_headers_never_reach_the_backend() {
    let mut backend = Server::new_async().await;
    let upstream = backend
        .mock("POST", "/api/chat/query")
        .match_header("connection", Matcher::Missing)
        .match_header("accept-encoding", Matcher::Missing)
        // the transport's own host header, not the inbound one
        .match_header("host", Matcher::Regex(r"^127\.0\.0\.1:\d+$".to_string()))
        // recomputed for the forwarded body, not the inbound claim of 999
        .match_header("content-length", "2")
        .match_header("x-session-id", "abc123")
        .match_header("x-tag", "a,b")
        .with_status(200)
        .with_body("ok")
        .create_async()
        .await;

    let (status, _, _) = send(
        app(Some(backend.url())),
        Request::builder()
            .method("POST")
            .uri("/api/chat/query")
            .header("host", "frontend.example.com")
            .header("connection", "keep-alive")
            .header("accept-encoding", "gzip, br")
            .header("content-length", "999")
            .header("x-session-id", "abc123")
            .header("x-tag", "a")
            .header("x-tag", "b")
            .body(Body::from("hi"))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    upstream.assert_async().await;
}

#[tokio::test]
async fn backend_429_passes_through_untouched() {
    let mut backend = Server::new_async().await;
    let quota = backend
        .mock("POST", "/api/chat/query")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"limit reached"}"#)
        .create_async()
        .await;

    let (status, _, body) = send(
        app(Some(backend.url())),
        Request::builder()
            .method("POST")
            .uri("/api/chat/query")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"user_id":"u1","session_id":"s1","query":"hi"}"#))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(parse(&body), json!({"detail": "limit reached"}));
    quota.assert_async().await;
}

#[tokio::test]
async fn unreachable_backend_answers_502_with_envelope() {
    // Nothing listens here.
    let (status, _, body) = send(
        app(Some("http://127.0.0.1:9".to_string())),
        Request::builder()
            .uri("/api/chat/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let envelope = parse(&body);
    assert_eq!(envelope["error"], "Proxy error");
    assert!(!envelope["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn stale_encoding_headers_are_not_relayed() {
    let mut backend = Server::new_async().await;
    let export = backend
        .mock("GET", "/api/chat/export")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_header("content-encoding", "gzip")
        .with_header("x-provider", "openai")
        .with_body("plain bytes")
        .create_async()
        .await;

    let (status, headers, body) = send(
        app(Some(backend.url())),
        Request::builder()
            .uri("/api/chat/export")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(!headers.contains_key("content-encoding"));
    assert!(!headers.contains_key("transfer-encoding"));
    assert_eq!(headers["content-type"], "text/plain");
    assert_eq!(headers["x-provider"], "openai");
    assert_eq!(&body[..], b"plain bytes");
    export.assert_async().await;
}

#[tokio::test]
async fn upstream_json_is_reemitted_canonically() {
    let mut backend = Server::new_async().await;
    backend
        .mock("GET", "/api/chat/greeting")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{ \"message\" : \"Hi!\" ,\n \"provider\" : \"openai\" }")
        .create_async()
        .await;

    let (status, headers, body) = send(
        app(Some(backend.url())),
        Request::builder()
            .uri("/api/chat/greeting")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "application/json");
    let expected = serde_json::to_vec(&json!({"message": "Hi!", "provider": "openai"})).unwrap();
    assert_eq!(&body[..], &expected[..]);
}

#[tokio::test]
async fn malformed_upstream_json_maps_to_502() {
    let mut backend = Server::new_async().await;
    backend
        .mock("GET", "/api/chat/health")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("not-json{")
        .create_async()
        .await;

    let (status, _, body) = send(
        app(Some(backend.url())),
        Request::builder()
            .uri("/api/chat/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let envelope = parse(&body);
    assert_eq!(envelope["error"], "Proxy error");
    assert!(envelope["detail"]
        .as_str()
        .unwrap()
        .contains("upstream response"));
}

#[tokio::test]
async fn backend_error_statuses_relay_verbatim() {
    let mut backend = Server::new_async().await;
    backend
        .mock("GET", "/api/chat/history/u1/42")
        .with_status(500)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"Internal server error. Please try again later."}"#)
        .create_async()
        .await;

    let (status, _, body) = send(
        app(Some(backend.url())),
        Request::builder()
            .uri("/api/chat/history/u1/42")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    // The backend's own 500 is not a proxy failure: body relays untouched.
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        parse(&body),
        json!({"detail": "Internal server error. Please try again later."})
    );
}

#[tokio::test]
async fn healthz_reports_proxy_liveness_without_a_backend() {
    let (status, _, body) = send(
        app(None),
        Request::builder()
            .uri("/healthz")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({"status": "ok"}));
}
