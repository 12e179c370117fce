//! JSON codec for the LED command protocol.
//!
//! Decoding is split in two: [`decode_payload`] only parses, and the
//! `command` field can only be read from the [`CommandPayload`] it returns.
//! A body that failed to parse therefore never reaches field extraction.

use crate::messages::{Command, CommandRequest, CommandResponse, COMMAND_FIELD};
use thiserror::Error;

/// Errors that can occur while decoding a request.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The request had no body.
    #[error("Empty request body")]
    Empty,

    /// The body is not valid JSON.
    #[error("Malformed JSON payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A successfully parsed request body.
#[derive(Debug, Clone)]
pub struct CommandPayload(serde_json::Value);

impl CommandPayload {
    /// The command this payload carries.
    ///
    /// A missing field, a non-string value or a non-object payload all yield
    /// `Unrecognized("")`.
    pub fn command(&self) -> Command {
        match self.0.get(COMMAND_FIELD).and_then(serde_json::Value::as_str) {
            Some(raw) => Command::parse(raw),
            None => Command::Unrecognized(String::new()),
        }
    }
}

/// Parse a request body.
pub fn decode_payload(bytes: &[u8]) -> Result<CommandPayload, DecodeError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty);
    }
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    Ok(CommandPayload(value))
}

/// Encode a request body for `command`.
pub fn encode_request(command: &Command) -> Result<String, serde_json::Error> {
    serde_json::to_string(&CommandRequest::new(command))
}

/// Encode a response body.
pub fn encode_response(response: &CommandResponse) -> Result<String, serde_json::Error> {
    serde_json::to_string(response)
}
