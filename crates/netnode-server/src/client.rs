//! Outbound HTTP connector (blocking reqwest).
//!
//! Must be used from a plain thread, never from inside a tokio runtime: the
//! blocking client drives its own runtime internally.

use std::io::{self, Read};
use std::time::Duration;

use netnode_core::{ConnectError, HttpConnector, ResponseBody};
use tracing::debug;

/// Size of each body read handed to the chunk observer.
pub const CHUNK_SIZE: usize = 512;

/// [`HttpConnector`] over `reqwest::blocking`.
pub struct ReqwestConnector {
    client: reqwest::blocking::Client,
    chunk_size: usize,
}

impl ReqwestConnector {
    pub fn new(timeout: Duration) -> Result<Self, ConnectError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectError::Connect(e.to_string()))?;
        Ok(Self {
            client,
            chunk_size: CHUNK_SIZE,
        })
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

impl HttpConnector for ReqwestConnector {
    type Body = ReqwestBody;

    fn get(&mut self, url: &str) -> Result<ReqwestBody, ConnectError> {
        let response = self.client.get(url).send().map_err(map_request_error)?;
        debug!("Response status {}", response.status());
        Ok(ReqwestBody {
            response,
            buf: vec![0; self.chunk_size],
        })
    }
}

/// Streaming response body.
pub struct ReqwestBody {
    response: reqwest::blocking::Response,
    buf: Vec<u8>,
}

impl ResponseBody for ReqwestBody {
    fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ConnectError> {
        loop {
            match self.response.read(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(self.buf[..n].to_vec())),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Err(ConnectError::Timeout),
                Err(e) => return Err(ConnectError::Read(e.to_string())),
            }
        }
    }
}

fn map_request_error(e: reqwest::Error) -> ConnectError {
    if e.is_timeout() {
        ConnectError::Timeout
    } else if e.is_builder() {
        ConnectError::InvalidUrl(e.to_string())
    } else {
        ConnectError::Connect(e.to_string())
    }
}
