//! Request handling for the `/led` endpoint.
//!
//! [`CommandService`] holds the business logic; the HTTP framework only has
//! to collect the body into a [`BodyBuffer`] and turn the returned [`Reply`]
//! into its own response type. Each call is independent, so the service can
//! be shared across concurrent requests behind an `Arc`.

use netnode_core::{DigitalOutput, Level, SharedOutput};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::codec::{decode_payload, encode_response, DecodeError};
use crate::messages::{
    Command, CommandResponse, INVALID_COMMAND, INVALID_PAYLOAD, LED_OFF_MESSAGE, LED_ON_MESSAGE,
    OUTPUT_FAILED, READ_FAILED,
};

/// The transport failed while receiving the request body.
#[derive(Debug, Error)]
#[error("failed to read request body: {0}")]
pub struct ReadError(pub String);

/// Fixed-capacity request body.
///
/// Bytes beyond the limit are dropped and the body is flagged as truncated;
/// an oversized request is never an error in itself.
#[derive(Debug)]
pub struct BodyBuffer {
    bytes: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl BodyBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(limit),
            limit,
            truncated: false,
        }
    }

    /// Bytes that can still be accepted.
    pub fn remaining(&self) -> usize {
        self.limit - self.bytes.len()
    }

    /// Append as much of `chunk` as fits.
    ///
    /// Returns `false` once the buffer is full and reading can stop.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        let take = chunk.len().min(self.remaining());
        if take < chunk.len() {
            self.truncated = true;
        }
        self.bytes.extend_from_slice(&chunk[..take]);
        self.remaining() > 0
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        if self.truncated {
            warn!("Request body truncated to {} bytes", self.limit);
        }
        self.bytes
    }
}

/// Outcome of one request, independent of the HTTP framework.
#[derive(Debug)]
pub enum Reply {
    /// ON/OFF applied.
    Message(CommandResponse),
    /// Valid JSON, unknown command.
    InvalidCommand,
    /// Body did not decode.
    BadPayload(DecodeError),
    /// Body could not be received.
    ReadFailed(ReadError),
    /// The LED could not be driven.
    OutputFailed,
}

impl Reply {
    pub fn status(&self) -> u16 {
        match self {
            Reply::Message(_) | Reply::InvalidCommand => 200,
            Reply::BadPayload(_) => 400,
            Reply::ReadFailed(_) | Reply::OutputFailed => 500,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == 200
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Reply::Message(_) => "application/json",
            _ => "text/plain",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Reply::Message(response) => match encode_response(response) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to encode response: {}", e);
                    String::new()
                }
            },
            Reply::InvalidCommand => INVALID_COMMAND.to_string(),
            Reply::BadPayload(_) => INVALID_PAYLOAD.to_string(),
            Reply::ReadFailed(_) => READ_FAILED.to_string(),
            Reply::OutputFailed => OUTPUT_FAILED.to_string(),
        }
    }
}

/// LED command handler.
pub struct CommandService {
    output: SharedOutput,
    max_body_bytes: usize,
}

impl CommandService {
    pub fn new(output: SharedOutput, max_body_bytes: usize) -> Self {
        Self {
            output,
            max_body_bytes,
        }
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// An empty buffer sized for one request.
    pub fn body_buffer(&self) -> BodyBuffer {
        BodyBuffer::new(self.max_body_bytes)
    }

    pub fn output(&self) -> &SharedOutput {
        &self.output
    }

    /// Handle one request whose body has been read (or failed to read).
    pub fn handle(&self, body: Result<Vec<u8>, ReadError>) -> Reply {
        let bytes = match body {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("{}", e);
                return Reply::ReadFailed(e);
            }
        };

        let payload = match decode_payload(&bytes) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Rejecting request: {}", e);
                return Reply::BadPayload(e);
            }
        };

        self.apply(payload.command())
    }

    /// Drive the LED for a decoded command.
    pub fn apply(&self, command: Command) -> Reply {
        let (level, message) = match command {
            Command::On => (Level::High, LED_ON_MESSAGE),
            Command::Off => (Level::Low, LED_OFF_MESSAGE),
            Command::Unrecognized(raw) => {
                debug!("Unrecognized command '{}'", raw);
                return Reply::InvalidCommand;
            }
        };

        if let Err(e) = self.output.set_level(level) {
            error!("{}", e);
            return Reply::OutputFailed;
        }
        info!("{}", message);
        Reply::Message(CommandResponse::new(message))
    }
}
