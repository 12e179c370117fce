//! HTTP server and client for ESP32.
//!
//! The command server registers `POST /led` on an `EspHttpServer`; the
//! connector streams outbound GET responses from an `EspHttpConnection`.

use std::sync::Arc;
use std::time::Duration;

use esp_idf_svc::{
    http::{
        client::{Configuration as ClientConfig, EspHttpConnection},
        server::{Configuration as ServerConfig, EspHttpConnection as ServerConnection, EspHttpServer},
        Method,
    },
    io::{Read, Write},
};
use embedded_svc::http::server::Request;
use log::info;

use netnode_core::{ConnectError, HttpConnector, ResponseBody, ServerLauncher, StartServerError};
use netnode_protocol::{CommandService, ReadError, Reply, LED_PATH};

/// Starts an `EspHttpServer` serving LED commands.
pub struct EspServerLauncher {
    port: u16,
    service: Arc<CommandService>,
}

impl EspServerLauncher {
    pub fn new(port: u16, service: Arc<CommandService>) -> Self {
        Self { port, service }
    }
}

impl ServerLauncher for EspServerLauncher {
    /// Dropping the server stops it.
    type Handle = EspHttpServer<'static>;

    fn start(&mut self) -> Result<EspHttpServer<'static>, StartServerError> {
        let config = ServerConfig {
            http_port: self.port,
            lru_purge_enable: true,
            ..Default::default()
        };

        info!("Starting server on port: '{}'", self.port);
        let mut server =
            EspHttpServer::new(&config).map_err(|e| StartServerError::Runtime(e.to_string()))?;

        info!("Registering URI handlers");
        let service = self.service.clone();
        server
            .fn_handler::<anyhow::Error, _>(LED_PATH, Method::Post, move |req| {
                handle_led(&service, req)
            })
            .map_err(|e| StartServerError::Runtime(e.to_string()))?;

        Ok(server)
    }
}

fn handle_led(
    service: &CommandService,
    mut req: Request<&mut ServerConnection<'_>>,
) -> anyhow::Result<()> {
    let received = read_body(&mut req, service);
    let reply = service.handle(received);
    send_reply(req, &reply)
}

/// Read at most the service's body limit from the request.
fn read_body(
    req: &mut Request<&mut ServerConnection<'_>>,
    service: &CommandService,
) -> Result<Vec<u8>, ReadError> {
    let mut buffer = service.body_buffer();
    let mut chunk = [0u8; 64];
    loop {
        let n = req
            .read(&mut chunk)
            .map_err(|e| ReadError(format!("{:?}", e)))?;
        if n == 0 || !buffer.push(&chunk[..n]) {
            break;
        }
    }
    Ok(buffer.into_bytes())
}

fn send_reply(req: Request<&mut ServerConnection<'_>>, reply: &Reply) -> anyhow::Result<()> {
    let headers = [("Content-Type", reply.content_type())];
    let mut resp = req.into_response(reply.status(), None, &headers)?;
    resp.write_all(reply.body().as_bytes())?;
    Ok(())
}

/// [`HttpConnector`] over `EspHttpConnection`.
///
/// Each request opens a fresh connection; dropping the body closes it.
pub struct EspHttpConnector {
    timeout: Duration,
    chunk_size: usize,
}

impl EspHttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            chunk_size: 512,
        }
    }
}

impl HttpConnector for EspHttpConnector {
    type Body = EspResponseBody;

    fn get(&mut self, url: &str) -> Result<EspResponseBody, ConnectError> {
        let mut conn = EspHttpConnection::new(&ClientConfig {
            timeout: Some(self.timeout),
            ..Default::default()
        })
        .map_err(|e| ConnectError::Connect(e.to_string()))?;

        conn.initiate_request(Method::Get, url, &[])
            .map_err(|e| ConnectError::Connect(e.to_string()))?;
        conn.initiate_response()
            .map_err(|e| ConnectError::Connect(e.to_string()))?;

        Ok(EspResponseBody {
            conn,
            buf: vec![0; self.chunk_size],
        })
    }
}

pub struct EspResponseBody {
    conn: EspHttpConnection,
    buf: Vec<u8>,
}

impl ResponseBody for EspResponseBody {
    fn status(&self) -> u16 {
        self.conn.status()
    }

    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ConnectError> {
        match self.conn.read(&mut self.buf) {
            Ok(0) => Ok(None),
            Ok(n) => Ok(Some(self.buf[..n].to_vec())),
            Err(e) => Err(ConnectError::Read(e.to_string())),
        }
    }
}
