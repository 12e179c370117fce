//! Integration tests for the LED command server.
//!
//! Router-level tests drive the axum app in-process; the lifecycle tests
//! start a real server through the dispatcher and talk to it over TCP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

use netnode_core::{
    DigitalOutput, EventDispatcher, EventHandler, InterfaceConfig, Level, MemoryOutput,
    NetworkInterfaceManager, ServerLauncher,
};
use netnode_protocol::CommandService;
use netnode_server::{command_router, HttpServerLauncher, SimulatedRadio};

fn test_service() -> (Arc<CommandService>, Arc<MemoryOutput>) {
    let led = Arc::new(MemoryOutput::new(2));
    let service = Arc::new(CommandService::new(led.clone(), 100));
    (service, led)
}

/// Send one request to the router and return status, content type and body.
async fn send(
    service: Arc<CommandService>,
    method: Method,
    body: &str,
) -> (StatusCode, Option<String>, String) {
    let request = Request::builder()
        .method(method)
        .uri("/led")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = command_router(service).oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

fn any_local_addr() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

#[tokio::test]
async fn test_on_turns_led_on() {
    let (service, led) = test_service();

    let (status, content_type, body) = send(service, Method::POST, r#"{"command":"ON"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, r#"{"message":"LED is turned on"}"#);
    assert_eq!(led.level(), Level::High);
}

#[tokio::test]
async fn test_off_turns_led_off() {
    let (service, led) = test_service();
    led.set_level(Level::High).unwrap();

    let (status, _, body) = send(service, Method::POST, r#"{"command":"OFF"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":"LED is turned off"}"#);
    assert_eq!(led.level(), Level::Low);
}

#[tokio::test]
async fn test_unknown_command() {
    let (service, led) = test_service();

    let (status, content_type, body) =
        send(service, Method::POST, r#"{"command":"TOGGLE"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/plain"));
    assert_eq!(body, "Invalid command");
    assert_eq!(led.level(), Level::Low);
}

#[tokio::test]
async fn test_malformed_and_empty_bodies() {
    let (service, led) = test_service();
    led.set_level(Level::High).unwrap();

    for text in ["not json", ""] {
        let (status, _, body) = send(service.clone(), Method::POST, text).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", text);
        assert_eq!(body, "Invalid payload");
    }

    // The server keeps serving after bad requests.
    let (status, _, _) = send(service, Method::POST, r#"{"command":"OFF"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(led.level(), Level::Low);
}

#[tokio::test]
async fn test_oversized_body_is_truncated() {
    let (service, led) = test_service();
    let body = format!(r#"{{"command":"ON","padding":"{}"}}"#, "x".repeat(200));

    let (status, _, _) = send(service, Method::POST, &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(led.level(), Level::Low);
}

#[tokio::test]
async fn test_get_not_allowed() {
    let (service, _) = test_service();
    let (status, _, _) = send(service, Method::GET, "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_launcher_serves_over_tcp() {
    let (service, led) = test_service();
    let mut launcher =
        HttpServerLauncher::new(any_local_addr(), service, tokio::runtime::Handle::current());

    let handle = launcher.start().expect("server should start");
    assert!(handle.is_running());

    let response = reqwest::Client::new()
        .post(format!("http://{}/led", handle.local_addr()))
        .body(r#"{"command":"ON"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.text().await.unwrap(),
        r#"{"message":"LED is turned on"}"#
    );
    assert_eq!(led.level(), Level::High);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_launcher_reports_bind_failure() {
    let (service, _) = test_service();
    let taken = std::net::TcpListener::bind(any_local_addr()).unwrap();
    let mut launcher = HttpServerLauncher::new(
        taken.local_addr().unwrap(),
        service,
        tokio::runtime::Handle::current(),
    );

    assert!(launcher.start().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_first_peer_starts_server_once() {
    let (service, led) = test_service();
    let launcher =
        HttpServerLauncher::new(any_local_addr(), service, tokio::runtime::Handle::current());

    let radio = SimulatedRadio::new()
        .with_link_delay(Duration::from_millis(5))
        .with_peers(2);
    let config = InterfaceConfig::access_point("ledserver", "mypassword", 1, 4);
    let (manager, events) = NetworkInterfaceManager::initialize(radio, config).unwrap();

    // Drive the control loop off the runtime: InterfaceStarting + two joins.
    let dispatcher = tokio::task::spawn_blocking(move || {
        let mut dispatcher = EventDispatcher::access_point(launcher);
        for _ in 0..3 {
            let event = events
                .next_event_timeout(Duration::from_secs(2))
                .expect("event");
            dispatcher.on_event(event);
        }
        dispatcher
    })
    .await
    .unwrap();

    assert_eq!(dispatcher.peers().count(), 2);
    let server = dispatcher.server().expect("server started");
    assert!(server.is_running());

    let response = reqwest::Client::new()
        .post(format!("http://{}/led", server.local_addr()))
        .body(r#"{"command":"ON"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(led.level(), Level::High);

    drop(manager);
}
