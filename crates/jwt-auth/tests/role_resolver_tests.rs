//! Remote role service client tests.
//!
//! Runs the HTTP resolver against a wiremock server with millisecond
//! backoff.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use jwt_auth::config::RoleServiceConfig;
use jwt_auth::services::{HttpRoleResolver, RoleRecord, RoleResolver};
use jwt_auth_test_utils::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUBJECT: &str = "user-1";
const ROLES_PATH: &str = "/api/v1/roles/user-1";
const AUTHORIZATION: &str = "Bearer forwarded-token";

fn resolver(base_url: &str, max_attempts: u32) -> HttpRoleResolver {
    let config = RoleServiceConfig::new(base_url)
        .with_retry(fast_retry(max_attempts))
        .with_request_timeout(Duration::from_secs(2));
    HttpRoleResolver::new(&config).unwrap()
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap().len()
}

/// Role service that closes the first `drops` connections without replying,
/// then answers every request with `body`. Returns its base URL and a
/// connection counter.
async fn flaky_role_service(drops: usize, body: &'static str) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let connections = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&connections);
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let seen = counter.fetch_add(1, Ordering::SeqCst);
            if seen < drops {
                drop(stream);
                continue;
            }
            tokio::spawn(respond_json(stream, body));
        }
    });

    (base_url, connections)
}

async fn respond_json(mut stream: TcpStream, body: &'static str) {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

#[tokio::test]
async fn test_fetch_roles_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROLES_PATH))
        .and(header("authorization", AUTHORIZATION))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "editor", "id": 3},
            {"name": "viewer"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let roles = resolver(&mock_server.uri(), 5)
        .fetch_roles(SUBJECT, AUTHORIZATION)
        .await
        .unwrap();

    let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["editor", "viewer"]);
}

#[tokio::test]
async fn test_success_on_fifth_attempt() {
    let mock_server = MockServer::start().await;

    // First four requests fail, then succeed
    Mock::given(method("GET"))
        .and(path(ROLES_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(4)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(ROLES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "admin"}])))
        .mount(&mock_server)
        .await;

    let roles = resolver(&mock_server.uri(), 5)
        .fetch_roles(SUBJECT, AUTHORIZATION)
        .await
        .unwrap();

    assert_eq!(roles, vec![RoleRecord::named("admin")]);
    assert_eq!(request_count(&mock_server).await, 5);
}

#[tokio::test]
async fn test_five_failures_propagate_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROLES_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    resolver(&mock_server.uri(), 5)
        .fetch_roles(SUBJECT, AUTHORIZATION)
        .await
        .assert_upstream();

    assert_eq!(request_count(&mock_server).await, 5);
}

#[tokio::test]
async fn test_client_errors_are_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROLES_PATH))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(ROLES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let roles = resolver(&mock_server.uri(), 5)
        .fetch_roles(SUBJECT, AUTHORIZATION)
        .await
        .unwrap();

    assert!(roles.is_empty());
    assert_eq!(request_count(&mock_server).await, 2);
}

#[tokio::test]
async fn test_malformed_body_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROLES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    resolver(&mock_server.uri(), 5)
        .fetch_roles(SUBJECT, AUTHORIZATION)
        .await
        .assert_upstream();

    assert_eq!(request_count(&mock_server).await, 1);
}

#[tokio::test]
async fn test_success_after_four_dropped_connections() {
    let (base_url, connections) = flaky_role_service(4, r#"[{"name":"editor"}]"#).await;

    let roles = resolver(&base_url, 5)
        .fetch_roles(SUBJECT, AUTHORIZATION)
        .await
        .unwrap();

    assert_eq!(roles, vec![RoleRecord::named("editor")]);
    assert_eq!(connections.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_five_dropped_connections_propagate_upstream_error() {
    let (base_url, connections) = flaky_role_service(usize::MAX, "[]").await;

    resolver(&base_url, 5)
        .fetch_roles(SUBJECT, AUTHORIZATION)
        .await
        .assert_upstream();

    assert_eq!(connections.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_transport_failure_exhausts_retries() {
    // Nothing listens on port 1.
    resolver("http://127.0.0.1:1", 3)
        .fetch_roles(SUBJECT, AUTHORIZATION)
        .await
        .assert_upstream();
}

#[tokio::test]
async fn test_forwards_authorization_verbatim() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ROLES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    resolver(&format!("{}/", mock_server.uri()), 1)
        .fetch_roles(SUBJECT, "bearer lower-case-scheme")
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let request = requests.first().unwrap();
    assert_eq!(
        request.headers.get("authorization").unwrap(),
        "bearer lower-case-scheme"
    );
    assert!(request.headers.get("cookie").is_none());
}

#[tokio::test]
async fn test_subject_is_escaped_as_one_path_segment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/roles/team%2Fadmin%3Fall=1%23x"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "viewer"}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let roles = resolver(&mock_server.uri(), 1)
        .fetch_roles("team/admin?all=1#x", AUTHORIZATION)
        .await
        .unwrap();

    assert_eq!(roles, vec![RoleRecord::named("viewer")]);
    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.first().unwrap().url.query().is_none());
}
