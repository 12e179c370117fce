//! Command server (axum).
//!
//! Serves `POST /led`. The handler streams the body into a bounded
//! [`BodyBuffer`], hands it to the shared [`CommandService`] and maps the
//! reply onto an HTTP response. The server itself is started lazily through
//! [`HttpServerLauncher`] when the dispatcher sees the first peer.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use futures::StreamExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info};

use netnode_core::{ServerLauncher, StartServerError};
use netnode_protocol::{BodyBuffer, CommandService, ReadError, Reply, LED_PATH};

/// Build the command router.
pub fn command_router(service: Arc<CommandService>) -> Router {
    Router::new()
        .route(LED_PATH, post(led_handler))
        .with_state(service)
}

/// POST /led
async fn led_handler(State(service): State<Arc<CommandService>>, body: Body) -> Response {
    let received = read_body(body, service.body_buffer()).await;
    let reply = service.handle(received);
    into_response(&reply)
}

/// Read at most the buffer's capacity from the request body.
async fn read_body(body: Body, mut buffer: BodyBuffer) -> Result<Vec<u8>, ReadError> {
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ReadError(e.to_string()))?;
        if !buffer.push(&chunk) {
            break;
        }
    }
    Ok(buffer.into_bytes())
}

fn into_response(reply: &Reply) -> Response {
    let status = StatusCode::from_u16(reply.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, reply.content_type())],
        reply.body(),
    )
        .into_response()
}

/// A running command server.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address the server actually bound.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Starts the command server on a tokio runtime.
///
/// `start` is called from the dispatcher's control thread, which is not a
/// runtime worker; binding happens synchronously so a bind failure is
/// returned to the dispatcher instead of being lost in a spawned task.
pub struct HttpServerLauncher {
    addr: SocketAddr,
    service: Arc<CommandService>,
    runtime: Handle,
}

impl HttpServerLauncher {
    pub fn new(addr: SocketAddr, service: Arc<CommandService>, runtime: Handle) -> Self {
        Self {
            addr,
            service,
            runtime,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl ServerLauncher for HttpServerLauncher {
    type Handle = ServerHandle;

    fn start(&mut self) -> Result<ServerHandle, StartServerError> {
        info!("Starting server on port: '{}'", self.addr.port());

        let std_listener = std::net::TcpListener::bind(self.addr)?;
        std_listener.set_nonblocking(true)?;
        let local_addr = std_listener.local_addr()?;

        let listener = {
            let _guard = self.runtime.enter();
            tokio::net::TcpListener::from_std(std_listener)?
        };

        info!("Registering URI handlers");
        let app = command_router(self.service.clone());
        let task = self.runtime.spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Command server error: {}", e);
            }
        });

        info!("Command server listening on {}", local_addr);
        Ok(ServerHandle { local_addr, task })
    }
}
