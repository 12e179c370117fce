//! Outbound GET through the blocking connector against a local axum server.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{routing::get, Router};

use netnode_core::{perform_get, ConnectError, GetSummary};
use netnode_server::ReqwestConnector;

const PAGE: &str = "hello from the test server";

async fn serve_test_page() -> SocketAddr {
    let app = Router::new()
        .route("/test", get(|| async { PAGE }))
        .route("/big", get(|| async { "y".repeat(2000) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Run the blocking client on a plain thread, outside the runtime.
async fn fetch(url: String, chunk_size: usize) -> (Result<GetSummary, ConnectError>, Vec<u8>) {
    let worker = std::thread::spawn(move || {
        let mut connector = ReqwestConnector::new(Duration::from_secs(5))
            .unwrap()
            .with_chunk_size(chunk_size);
        let mut received = Vec::new();
        let result = perform_get(&mut connector, &url, |chunk| {
            received.extend_from_slice(chunk)
        });
        (result, received)
    });
    tokio::task::spawn_blocking(move || worker.join().unwrap())
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_get_delivers_body() {
    let addr = serve_test_page().await;

    let (result, received) = fetch(format!("http://{}/test", addr), 512).await;

    let summary = result.unwrap();
    assert_eq!(summary.status, 200);
    assert_eq!(summary.bytes, PAGE.len());
    assert_eq!(received, PAGE.as_bytes());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_large_body_arrives_in_chunks() {
    let addr = serve_test_page().await;

    let (result, received) = fetch(format!("http://{}/big", addr), 256).await;

    let summary = result.unwrap();
    assert_eq!(summary.bytes, 2000);
    assert!(summary.chunks >= 2000 / 256);
    assert_eq!(received.len(), 2000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_path_reports_status() {
    let addr = serve_test_page().await;

    let (result, received) = fetch(format!("http://{}/nope", addr), 512).await;

    assert_eq!(result.unwrap().status, 404);
    assert!(received.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_connection_refused() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let (result, received) = fetch(format!("http://127.0.0.1:{}/test", port), 512).await;

    assert!(matches!(result, Err(ConnectError::Connect(_))));
    assert!(received.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_non_http_url_rejected() {
    let (result, _) = fetch("ftp://example.invalid/test".to_string(), 512).await;
    assert!(matches!(result, Err(ConnectError::InvalidUrl(_))));
}
