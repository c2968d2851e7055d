//! End-to-end tests: real sockets through the proxy to a mock backend.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use common::{
    not_found_response, ok_response, request_body, request_path, start_mock_backend, MockBackend,
};
use thinking_proxy::{ProxyConfig, ThinkingProxy};

/// Start a proxy on an ephemeral port wired to the given backend address.
async fn start_proxy(backend_addr: SocketAddr) -> (ThinkingProxy, SocketAddr) {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.backend.host = backend_addr.ip().to_string();
    config.backend.port = backend_addr.port();

    let proxy = ThinkingProxy::new(config);
    let addr = proxy.start().await.unwrap();
    (proxy, addr)
}

/// Send raw bytes to the proxy and collect the full response (read to EOF).
async fn send_raw(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("response timed out")
        .unwrap();
    String::from_utf8_lossy(&response).to_string()
}

fn post_json(path: &str, body: &str) -> String {
    format!(
        "POST {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        path,
        body.len(),
        body
    )
}

async fn single_request(backend: &MockBackend) -> String {
    let requests = backend.requests().await;
    assert_eq!(requests.len(), 1, "expected exactly one backend request");
    requests[0].clone()
}

#[tokio::test]
async fn thinking_suffix_is_rewritten_for_backend() {
    let backend = start_mock_backend(|_| ok_response("{\"ok\":true}")).await;
    let (proxy, addr) = start_proxy(backend.addr).await;

    let body = r#"{"model":"claude-sonnet-4-5-20250929-thinking-5000","max_tokens":1000}"#;
    let response = send_raw(addr, &post_json("/v1/messages", body)).await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("{\"ok\":true}"));

    let seen = single_request(&backend).await;
    let forwarded: serde_json::Value = serde_json::from_str(request_body(&seen)).unwrap();
    assert_eq!(forwarded["model"], "claude-sonnet-4-5-20250929");
    assert_eq!(forwarded["thinking"]["type"], "enabled");
    assert_eq!(forwarded["thinking"]["budget_tokens"], 5000);
    assert_eq!(forwarded["max_tokens"], 6024);

    assert!(seen.contains("anthropic-beta: interleaved-thinking-2025-05-14\r\n"));
    assert!(seen.contains("Connection: close\r\n"));
    assert!(seen.contains(&format!("Host: {}\r\n", proxy.config().backend.authority())));

    proxy.stop().await;
}

#[tokio::test]
async fn non_claude_body_is_forwarded_byte_identical() {
    let backend = start_mock_backend(|_| ok_response("done")).await;
    let (proxy, addr) = start_proxy(backend.addr).await;

    // Odd spacing survives only if the body is never re-serialized.
    let body = r#"{ "model" : "gpt-4" , "max_tokens" : 100 }"#;
    send_raw(addr, &post_json("/v1/chat/completions", body)).await;

    let seen = single_request(&backend).await;
    assert_eq!(request_body(&seen), body);
    assert!(!seen.contains("anthropic-beta"));

    proxy.stop().await;
}

#[tokio::test]
async fn provider_path_is_rewritten_to_api_provider() {
    let backend = start_mock_backend(|_| ok_response("provider-ok")).await;
    let (proxy, addr) = start_proxy(backend.addr).await;

    let response = send_raw(
        addr,
        "GET /provider/gemini/generate HTTP/1.1\r\nHost: localhost\r\n\r\n",
    )
    .await;
    assert!(response.ends_with("provider-ok"));

    let seen = single_request(&backend).await;
    assert_eq!(request_path(&seen), "/api/provider/gemini/generate");

    proxy.stop().await;
}

#[tokio::test]
async fn unprefixed_404_is_retried_once_with_api_prefix() {
    let backend = start_mock_backend(|raw| {
        if request_path(raw) == "/chat" {
            not_found_response()
        } else {
            ok_response("after-retry")
        }
    })
    .await;
    let (proxy, addr) = start_proxy(backend.addr).await;

    let response = send_raw(addr, "GET /chat HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.ends_with("after-retry"));

    let requests = backend.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(request_path(&requests[0]), "/chat");
    assert_eq!(request_path(&requests[1]), "/api/chat");

    proxy.stop().await;
}

#[tokio::test]
async fn v1_prefixed_404_is_not_retried() {
    let backend = start_mock_backend(|_| not_found_response()).await;
    let (proxy, addr) = start_proxy(backend.addr).await;

    let response = send_raw(addr, "GET /v1/chat HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 404"));

    assert_eq!(backend.requests().await.len(), 1);

    proxy.stop().await;
}

#[tokio::test]
async fn second_404_after_retry_is_forwarded_as_is() {
    let backend = start_mock_backend(|_| not_found_response()).await;
    let (proxy, addr) = start_proxy(backend.addr).await;

    let response = send_raw(addr, "GET /chat HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 404"));
    assert!(response.ends_with("404 page not found"));

    // Exactly one retry, never more.
    assert_eq!(backend.requests().await.len(), 2);

    proxy.stop().await;
}

#[tokio::test]
async fn malformed_request_line_gets_400() {
    let backend = start_mock_backend(|_| ok_response("unreachable")).await;
    let (proxy, addr) = start_proxy(backend.addr).await;

    let response = send_raw(addr, "GARBAGE\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 400"));
    assert!(response.contains("Connection: close\r\n"));
    assert!(backend.requests().await.is_empty());

    proxy.stop().await;
}

#[tokio::test]
async fn unreachable_backend_gets_502() {
    // Grab a port that nothing listens on.
    let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = unused.local_addr().unwrap();
    drop(unused);

    let (proxy, addr) = start_proxy(dead_addr).await;

    let response = send_raw(addr, "GET /v1/chat HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 502"));

    proxy.stop().await;
}

#[tokio::test]
async fn gemini_claude_model_keeps_thinking_token() {
    let backend = start_mock_backend(|_| ok_response("ok")).await;
    let (proxy, addr) = start_proxy(backend.addr).await;

    let body = r#"{"model":"gemini-claude-opus-4-5-thinking-10000"}"#;
    send_raw(addr, &post_json("/v1/messages", body)).await;

    let seen = single_request(&backend).await;
    let forwarded: serde_json::Value = serde_json::from_str(request_body(&seen)).unwrap();
    assert_eq!(forwarded["model"], "gemini-claude-opus-4-5-thinking");
    assert_eq!(forwarded["thinking"]["budget_tokens"], 10000);

    proxy.stop().await;
}

#[tokio::test]
async fn client_beta_header_is_merged_not_duplicated() {
    let backend = start_mock_backend(|_| ok_response("ok")).await;
    let (proxy, addr) = start_proxy(backend.addr).await;

    let body = r#"{"model":"claude-x-thinking-2000"}"#;
    let request = format!(
        "POST /v1/messages HTTP/1.1\r\nHost: localhost\r\nanthropic-beta: other-beta\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    send_raw(addr, &request).await;

    let seen = single_request(&backend).await;
    assert!(seen.contains("anthropic-beta: other-beta,interleaved-thinking-2025-05-14\r\n"));
    assert_eq!(seen.matches("anthropic-beta:").count(), 1);

    proxy.stop().await;
}

#[tokio::test]
async fn stop_releases_the_port() {
    let backend = start_mock_backend(|_| ok_response("ok")).await;
    let (proxy, addr) = start_proxy(backend.addr).await;
    assert!(proxy.is_running().await);

    proxy.stop().await;
    assert!(!proxy.is_running().await);

    // The port can be rebound immediately.
    let rebound = TcpListener::bind(addr).await;
    assert!(rebound.is_ok());
}
